//! Error types for playback coordination

use std::path::PathBuf;
use thiserror::Error;

/// Playback errors
///
/// None of these are fatal. Every operation that returns one has already
/// logged it and left session, controller and now-playing state exactly as
/// they were before the call.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Playlist has no songs
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Index outside the playlist
    #[error("Index {index} out of bounds for playlist of {len} songs")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Nothing selected to play
    #[error("No current song")]
    NoCurrentSong,

    /// Song has a blank file path
    #[error("Song has no file path")]
    InvalidPath,

    /// Audio file missing at play time
    #[error("Audio file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Transport failed to load, decode, or output audio
    #[error("Transport error: {0}")]
    Transport(String),

    /// Media thread has shut down or stopped answering
    #[error("Media thread unavailable")]
    MediaThreadUnavailable,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
