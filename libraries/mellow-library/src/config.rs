/// Library configuration
use serde::{Deserialize, Serialize};

/// Scan and search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Number of distinct search queries kept cached (default: 64)
    pub search_cache_size: usize,

    /// Supported audio file extensions
    pub extensions: Vec<String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            search_cache_size: 64,
            extensions: vec!["mp3".to_string(), "wav".to_string(), "flac".to_string()],
        }
    }
}
