/// Collaborator traits for Mellow Player
///
/// The playback core never implements these itself; storage, scanning and
/// search live behind them so the core stays free of database and file
/// system concerns.
use crate::error::Result;
use crate::types::{SongId, SongRef, UserId};
use std::path::Path;

/// Producer of song lists
///
/// Implemented by the library scanner, the search catalog and by any
/// database-backed DAO. The playback session only ever consumes the lists it
/// returns and never calls back into it.
pub trait SongSource: Send + Sync {
    /// All songs found under `root`
    ///
    /// # Errors
    /// Returns an error if the root cannot be read
    fn songs(&self, root: &Path) -> Result<Vec<SongRef>>;

    /// Songs matching `query` (empty query returns everything known)
    ///
    /// # Errors
    /// Returns an error if the backing store cannot be queried
    fn search(&self, query: &str) -> Result<Vec<SongRef>>;
}

/// Persistence for liked songs
///
/// Mirrors the synchronous, boolean-returning DAO contract: `true` means the
/// store applied (or confirmed) the change, `false` means it failed. Callers
/// decide whether to retry.
pub trait LikedSongStore: Send + Sync {
    /// Mark a song as liked for a user
    fn like_song(&self, user: UserId, song: SongId) -> bool;

    /// Remove a song from a user's liked songs
    fn unlike_song(&self, user: UserId, song: SongId) -> bool;

    /// Whether a user likes a song
    fn is_song_liked(&self, user: UserId, song: SongId) -> bool;
}
