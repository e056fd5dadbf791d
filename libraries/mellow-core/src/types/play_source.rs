/// Navigation context for playback
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which UI surface started playback
///
/// Only used to route the back button; it carries no playback semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaySource {
    /// Song picked on the user dashboard
    #[default]
    Dashboard,

    /// Song picked from the all-songs view
    AllSongs,

    /// Song picked from a playlist view
    Playlist,

    /// Song picked from the liked-songs view
    LikedSongs,

    /// Song picked from the recommendation row (lives on the dashboard)
    Recommendation,
}

impl PlaySource {
    /// All sources, in declaration order
    pub const ALL: [PlaySource; 5] = [
        PlaySource::Dashboard,
        PlaySource::AllSongs,
        PlaySource::Playlist,
        PlaySource::LikedSongs,
        PlaySource::Recommendation,
    ];

    /// Screen the back button should return to
    pub fn screen_name(self) -> &'static str {
        match self {
            PlaySource::Dashboard | PlaySource::Recommendation => "UserDashboard",
            PlaySource::AllSongs => "AllSongs",
            PlaySource::Playlist => "Playlist",
            PlaySource::LikedSongs => "likedsong",
        }
    }

    /// Parse a snake_case source name (as used in config and CLI flags)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "dashboard" => Some(PlaySource::Dashboard),
            "all_songs" => Some(PlaySource::AllSongs),
            "playlist" => Some(PlaySource::Playlist),
            "liked_songs" => Some(PlaySource::LikedSongs),
            "recommendation" => Some(PlaySource::Recommendation),
            _ => None,
        }
    }
}

impl fmt::Display for PlaySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaySource::Dashboard => "dashboard",
            PlaySource::AllSongs => "all_songs",
            PlaySource::Playlist => "playlist",
            PlaySource::LikedSongs => "liked_songs",
            PlaySource::Recommendation => "recommendation",
        };
        f.write_str(name)
    }
}
