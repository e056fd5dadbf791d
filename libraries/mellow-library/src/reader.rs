/// Tag reader built on lofty
use crate::error::{LibraryError, Result};
use lofty::{AudioFile, TaggedFileExt};
use mellow_core::{Song, SongBuilder};
use std::path::Path;
use std::time::Duration;

/// Artist and album used when tags are missing
pub const UNKNOWN: &str = "Unknown";

/// Fields read from a file's tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Duration,
}

/// Reads song metadata from audio files
#[derive(Debug, Clone, Copy, Default)]
pub struct TagReader;

impl TagReader {
    /// Create a new tag reader
    pub fn new() -> Self {
        Self
    }

    /// Read title, artist, album and duration
    pub fn read_tags(&self, path: &Path) -> Result<SongTags> {
        if !path.exists() {
            return Err(LibraryError::NotFound(path.to_path_buf()));
        }

        let tagged_file = lofty::read_from_path(path)?;
        let mut tags = SongTags {
            duration: tagged_file.properties().duration(),
            ..Default::default()
        };

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.tags().first());
        if let Some(tag) = tag {
            for item in tag.items() {
                let Some(text) = item.value().text().map(str::trim).filter(|t| !t.is_empty())
                else {
                    continue;
                };
                match item.key() {
                    lofty::ItemKey::TrackTitle => tags.title = Some(text.to_string()),
                    lofty::ItemKey::TrackArtist => tags.artist = Some(text.to_string()),
                    lofty::ItemKey::AlbumTitle => tags.album = Some(text.to_string()),
                    _ => {}
                }
            }
        }

        Ok(tags)
    }

    /// Build a song for `path`, falling back to the file name when tags are
    /// missing or unreadable
    pub fn read_song(&self, path: &Path) -> SongBuilder {
        let tags = match self.read_tags(path) {
            Ok(tags) => tags,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Unreadable tags, using file name");
                SongTags::default()
            }
        };

        let title = tags.title.unwrap_or_else(|| file_stem(path));
        Song::builder(title, path)
            .artist(tags.artist.unwrap_or_else(|| UNKNOWN.to_string()))
            .album(tags.album.unwrap_or_else(|| UNKNOWN.to_string()))
            .duration(tags.duration)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_nonexistent_file_returns_error() {
        let reader = TagReader::new();
        let result = reader.read_tags(Path::new("/nonexistent/file.mp3"));
        assert!(matches!(result, Err(LibraryError::NotFound(_))));
    }

    #[test]
    fn garbage_file_falls_back_to_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Night Drive.mp3");
        std::fs::write(&path, b"not really audio").unwrap();

        let song = TagReader::new().read_song(&path).build();

        assert_eq!(song.title(), "Night Drive");
        assert_eq!(song.artist(), UNKNOWN);
        assert_eq!(song.album(), Some(UNKNOWN));
        assert_eq!(song.duration(), Duration::ZERO);
        assert_eq!(song.path(), path);
    }

    #[test]
    fn file_stem_without_extension() {
        assert_eq!(file_stem(Path::new("/music/README")), "README");
        assert_eq!(file_stem(Path::new("/music/a.b.flac")), "a.b");
    }
}
