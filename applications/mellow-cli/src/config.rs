/// Application configuration
use crate::error::Result;
use mellow_library::LibraryConfig;
use mellow_playback::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "mellow.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub player: PlayerConfig,
    pub library: LibraryConfig,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Use the silent transport even when audio output is compiled in
    pub silent: bool,

    /// Length of every song under the silent transport, in seconds
    pub silent_length_secs: u64,

    /// User whose likes the session toggles
    pub user_id: i64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            silent: false,
            silent_length_secs: 30,
            user_id: 1,
        }
    }
}

impl OutputSettings {
    pub fn silent_length(&self) -> Duration {
        Duration::from_secs(self.silent_length_secs)
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `mellow.toml` is used if
    /// present. `MELLOW_`-prefixed variables override file values, with `__`
    /// between section and key (`MELLOW_PLAYER__POLL_INTERVAL_MS=20`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("MELLOW")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }
}
