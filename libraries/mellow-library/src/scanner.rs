/// Library scanner implementation
use crate::config::LibraryConfig;
use crate::error::{LibraryError, Result};
use crate::reader::TagReader;
use mellow_core::{SongId, SongRef};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Finds supported audio files under a root folder and reads their tags
#[derive(Debug, Clone)]
pub struct LibraryScanner {
    reader: TagReader,
    extensions: Vec<String>,
}

impl LibraryScanner {
    /// Create a scanner for the default extensions
    pub fn new() -> Self {
        Self::with_config(&LibraryConfig::default())
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: &LibraryConfig) -> Self {
        Self {
            reader: TagReader::new(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Scan `root` recursively
    ///
    /// Songs come back in path order with ids `1..=n`. Unreadable
    /// directories are skipped; a file whose tags cannot be read still
    /// becomes a song named after the file.
    pub fn scan(&self, root: &Path) -> Result<Vec<SongRef>> {
        let files = self.discover_files(root)?;
        info!(root = %root.display(), files = files.len(), "Scanning library");

        let songs = files
            .iter()
            .zip(1..)
            .map(|(path, id)| self.reader.read_song(path).id(SongId::new(id)).build_ref())
            .collect();
        Ok(songs)
    }

    /// Discover audio files in a directory recursively, sorted by path
    pub fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.exists() {
            return Err(LibraryError::NotFound(root.to_path_buf()));
        }

        if root.is_file() {
            return Ok(if self.is_supported_file(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| self.is_supported_file(path))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Check if a file has a supported extension (case-insensitive)
    pub fn is_supported_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|s| s.eq_ignore_ascii_case(ext)))
    }
}

impl Default for LibraryScanner {
    fn default() -> Self {
        Self::new()
    }
}
