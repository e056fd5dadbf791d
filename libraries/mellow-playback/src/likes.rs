//! Like/unlike round trips
//!
//! The song's in-memory `liked` flag only changes after the store accepted
//! the change, and liked-songs views are told about it through the same UI
//! dispatcher as now-playing listeners.

use crate::dispatch::UiDispatcher;
use crate::lock;
use mellow_core::{LikedSongStore, SongRef, UserId};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Observer of liked-songs changes
pub trait LikedSongsListener: Send + Sync {
    /// `song` was liked (`true`) or unliked (`false`)
    fn liked_songs_changed(&self, song: &SongRef, liked: bool);
}

impl<F> LikedSongsListener for F
where
    F: Fn(&SongRef, bool) + Send + Sync,
{
    fn liked_songs_changed(&self, song: &SongRef, liked: bool) {
        self(song, liked);
    }
}

/// Applies like toggles through a `LikedSongStore`
pub struct LikeService {
    store: Arc<dyn LikedSongStore>,
    dispatcher: Arc<dyn UiDispatcher>,
    listeners: Mutex<Vec<Arc<dyn LikedSongsListener>>>,
}

impl LikeService {
    pub fn new(store: Arc<dyn LikedSongStore>, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Like if not liked, unlike otherwise
    ///
    /// Returns `false` when the store rejected the change; the flag is then
    /// left as it was.
    pub fn toggle_like(&self, user: UserId, song: &SongRef) -> bool {
        if song.is_liked() {
            self.unlike(user, song)
        } else {
            self.like(user, song)
        }
    }

    pub fn like(&self, user: UserId, song: &SongRef) -> bool {
        self.apply(user, song, true)
    }

    pub fn unlike(&self, user: UserId, song: &SongRef) -> bool {
        self.apply(user, song, false)
    }

    /// Reload the flag from the store and return it
    pub fn refresh(&self, user: UserId, song: &SongRef) -> bool {
        let Some(id) = song.id() else {
            return song.is_liked();
        };
        let liked = self.store.is_song_liked(user, id);
        song.set_liked(liked);
        liked
    }

    /// Register a listener; `false` if this handle is already registered
    pub fn register(&self, listener: Arc<dyn LikedSongsListener>) -> bool {
        let mut listeners = lock(&self.listeners);
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener; `false` if it was not registered
    pub fn unregister(&self, listener: &Arc<dyn LikedSongsListener>) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    fn apply(&self, user: UserId, song: &SongRef, liked: bool) -> bool {
        let Some(id) = song.id() else {
            warn!(title = song.title(), "Cannot like a song that was never stored");
            return false;
        };

        let accepted = if liked {
            self.store.like_song(user, id)
        } else {
            self.store.unlike_song(user, id)
        };
        if !accepted {
            warn!(%user, song = %id, liked, "Liked-song store rejected change");
            return false;
        }

        song.set_liked(liked);
        debug!(%user, song = %id, liked, "Liked songs changed");

        let listeners = lock(&self.listeners).clone();
        if !listeners.is_empty() {
            let song = Arc::clone(song);
            self.dispatcher.dispatch(Box::new(move || {
                for listener in &listeners {
                    listener.liked_songs_changed(&song, liked);
                }
            }));
        }
        true
    }
}

fn same_listener(a: &Arc<dyn LikedSongsListener>, b: &Arc<dyn LikedSongsListener>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InlineDispatcher;
    use mellow_core::{Song, SongId};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct TestStore {
        liked: Mutex<HashSet<(UserId, SongId)>>,
        failing: AtomicBool,
    }

    impl LikedSongStore for TestStore {
        fn like_song(&self, user: UserId, song: SongId) -> bool {
            if self.failing.load(Ordering::SeqCst) {
                return false;
            }
            self.liked.lock().unwrap().insert((user, song));
            true
        }

        fn unlike_song(&self, user: UserId, song: SongId) -> bool {
            if self.failing.load(Ordering::SeqCst) {
                return false;
            }
            self.liked.lock().unwrap().remove(&(user, song));
            true
        }

        fn is_song_liked(&self, user: UserId, song: SongId) -> bool {
            self.liked.lock().unwrap().contains(&(user, song))
        }
    }

    fn service() -> (LikeService, Arc<TestStore>) {
        let store = Arc::new(TestStore::default());
        let service = LikeService::new(store.clone(), Arc::new(InlineDispatcher));
        (service, store)
    }

    fn stored_song() -> SongRef {
        Song::builder("Stored", "/music/stored.mp3").id(SongId::new(7)).build_ref()
    }

    #[test]
    fn toggle_flips_flag_and_store() {
        let (service, store) = service();
        let user = UserId::new(1);
        let song = stored_song();

        assert!(service.toggle_like(user, &song));
        assert!(song.is_liked());
        assert!(store.is_song_liked(user, SongId::new(7)));

        assert!(service.toggle_like(user, &song));
        assert!(!song.is_liked());
        assert!(!store.is_song_liked(user, SongId::new(7)));
    }

    #[test]
    fn store_failure_leaves_flag_untouched() {
        let (service, store) = service();
        store.failing.store(true, Ordering::SeqCst);
        let song = stored_song();

        assert!(!service.toggle_like(UserId::new(1), &song));
        assert!(!song.is_liked());
    }

    #[test]
    fn unstored_song_cannot_be_liked() {
        let (service, _) = service();
        let song = Song::builder("Loose", "/music/loose.mp3").build_ref();
        assert!(!service.like(UserId::new(1), &song));
        assert!(!song.is_liked());
    }

    #[test]
    fn listeners_hear_successful_changes_only() {
        let (service, store) = service();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Arc<dyn LikedSongsListener> = Arc::new(move |song: &SongRef, liked: bool| {
            sink.lock().unwrap().push((song.title().to_string(), liked));
        });
        assert!(service.register(listener.clone()));
        assert!(!service.register(listener.clone()));

        let song = stored_song();
        service.like(UserId::new(1), &song);
        store.failing.store(true, Ordering::SeqCst);
        service.unlike(UserId::new(1), &song);

        assert_eq!(*seen.lock().unwrap(), vec![("Stored".to_string(), true)]);
        assert!(service.unregister(&listener));
    }

    #[test]
    fn refresh_reads_store() {
        let (service, store) = service();
        let user = UserId::new(3);
        let song = stored_song();
        store.like_song(user, SongId::new(7));

        assert!(service.refresh(user, &song));
        assert!(song.is_liked());
    }
}
