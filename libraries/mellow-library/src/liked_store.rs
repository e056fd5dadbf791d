/// In-memory liked-songs store
use mellow_core::{LikedSongStore, SongId, UserId};
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// `LikedSongStore` kept in process memory
///
/// Liking twice or unliking something never liked both succeed, matching an
/// idempotent database upsert/delete.
#[derive(Debug, Default)]
pub struct InMemoryLikedStore {
    liked: Mutex<BTreeSet<(UserId, SongId)>>,
}

impl InMemoryLikedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every song `user` likes, ascending
    pub fn liked_songs(&self, user: UserId) -> Vec<SongId> {
        self.liked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, song)| *song)
            .collect()
    }
}

impl LikedSongStore for InMemoryLikedStore {
    fn like_song(&self, user: UserId, song: SongId) -> bool {
        self.liked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((user, song));
        true
    }

    fn unlike_song(&self, user: UserId, song: SongId) -> bool {
        self.liked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(user, song));
        true
    }

    fn is_song_liked(&self, user: UserId, song: SongId) -> bool {
        self.liked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(user, song))
    }
}
