/// Song domain type
use crate::types::SongId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a song
///
/// Playlists, the session and every UI surface hold the same `Arc`, so a
/// like toggle made through one handle is visible through all of them.
pub type SongRef = Arc<Song>;

/// A playable song
///
/// Identity fields are immutable once built. The only mutable field is the
/// `liked` flag, which mirrors persistence and is updated after a successful
/// like/unlike round trip.
#[derive(Debug, Serialize, Deserialize)]
pub struct Song {
    id: Option<SongId>,
    title: String,
    artist: String,
    album: Option<String>,
    duration: Duration,
    path: PathBuf,
    image_path: Option<PathBuf>,
    #[serde(default)]
    liked: AtomicBool,
}

impl Song {
    /// Start building a song from its title and file path
    pub fn builder(title: impl Into<String>, path: impl Into<PathBuf>) -> SongBuilder {
        SongBuilder {
            id: None,
            title: title.into(),
            artist: String::new(),
            album: None,
            duration: Duration::ZERO,
            path: path.into(),
            image_path: None,
            liked: false,
        }
    }

    /// Persistence id, if the song has been stored
    pub fn id(&self) -> Option<SongId> {
        self.id
    }

    /// Song title
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Artist name
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Album name
    pub fn album(&self) -> Option<&str> {
        self.album.as_deref()
    }

    /// Song length
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Audio file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cover art location
    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    /// Whether the current user likes this song
    pub fn is_liked(&self) -> bool {
        self.liked.load(Ordering::Acquire)
    }

    /// Update the liked flag
    ///
    /// Callers must only do this after persistence confirmed the change.
    pub fn set_liked(&self, liked: bool) {
        self.liked.store(liked, Ordering::Release);
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> SongRef {
        Arc::new(self)
    }
}

impl Clone for Song {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            duration: self.duration,
            path: self.path.clone(),
            image_path: self.image_path.clone(),
            liked: AtomicBool::new(self.is_liked()),
        }
    }
}

// The liked flag is user state, not identity.
impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.path == other.path
            && self.title == other.title
            && self.artist == other.artist
            && self.album == other.album
            && self.duration == other.duration
            && self.image_path == other.image_path
    }
}

impl Eq for Song {}

/// Builder for [`Song`]
#[derive(Debug, Clone)]
pub struct SongBuilder {
    id: Option<SongId>,
    title: String,
    artist: String,
    album: Option<String>,
    duration: Duration,
    path: PathBuf,
    image_path: Option<PathBuf>,
    liked: bool,
}

impl SongBuilder {
    /// Set the persistence id
    pub fn id(mut self, id: SongId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the artist name
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = artist.into();
        self
    }

    /// Set the album name
    pub fn album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the song length
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the cover art location
    pub fn image_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_path = Some(path.into());
        self
    }

    /// Set the initial liked flag
    pub fn liked(mut self, liked: bool) -> Self {
        self.liked = liked;
        self
    }

    /// Finish building
    pub fn build(self) -> Song {
        Song {
            id: self.id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            duration: self.duration,
            path: self.path,
            image_path: self.image_path,
            liked: AtomicBool::new(self.liked),
        }
    }

    /// Finish building into a shared handle
    pub fn build_ref(self) -> SongRef {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Song {
        Song::builder("So What", "/music/so_what.flac")
            .artist("Miles Davis")
            .album("Kind of Blue")
            .duration(Duration::from_secs(562))
            .id(SongId::new(1))
            .build()
    }

    #[test]
    fn equality_ignores_liked_flag() {
        let a = sample();
        let b = sample();
        b.set_liked(true);
        assert_eq!(a, b);
    }

    #[test]
    fn equality_respects_identity_fields() {
        let a = sample();
        let b = Song::builder("So What", "/music/other.flac")
            .artist("Miles Davis")
            .album("Kind of Blue")
            .duration(Duration::from_secs(562))
            .id(SongId::new(1))
            .build();
        assert_ne!(a, b);
    }

    #[test]
    fn liked_flag_is_shared_through_ref() {
        let song = sample().into_ref();
        let view = Arc::clone(&song);
        song.set_liked(true);
        assert!(view.is_liked());
    }

    #[test]
    fn clone_copies_liked_flag() {
        let song = sample();
        song.set_liked(true);
        let copy = song.clone();
        assert!(copy.is_liked());
        copy.set_liked(false);
        assert!(song.is_liked());
    }

    #[test]
    fn serde_round_trip_keeps_fields() {
        let song = sample();
        song.set_liked(true);
        let json = serde_json::to_string(&song).unwrap();
        let back: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(back, song);
        assert!(back.is_liked());
    }
}
