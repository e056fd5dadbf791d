//! Now-playing projection
//!
//! The single observable record of what the UI should show: current song,
//! whether it is audibly playing, and which screen the playlist came from.
//! Listeners get the full `(song, playing)` snapshot after every mutation.

use crate::dispatch::UiDispatcher;
use crate::lock;
use mellow_core::{PlaySource, SongRef};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Observer of now-playing changes
///
/// Called on the UI dispatcher's context, in registration order, once per
/// mutation. Plain closures `Fn(Option<&SongRef>, bool)` implement this.
pub trait NowPlayingListener: Send + Sync {
    /// Current song (if any) and play flag right after a mutation
    fn now_playing_changed(&self, song: Option<&SongRef>, playing: bool);
}

impl<F> NowPlayingListener for F
where
    F: Fn(Option<&SongRef>, bool) + Send + Sync,
{
    fn now_playing_changed(&self, song: Option<&SongRef>, playing: bool) {
        self(song, playing);
    }
}

/// Point-in-time copy of the now-playing record
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingSnapshot {
    pub song: Option<SongRef>,
    pub playing: bool,
    pub source: PlaySource,
}

/// Observable now-playing state
///
/// Cheap to clone; every clone is the same record. Mutations are serialized
/// and their notifications are handed to the dispatcher in mutation order, so
/// listeners never see an older snapshot after a newer one.
#[derive(Clone)]
pub struct NowPlayingState {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    // Held from mutation until the notification is queued.
    order: Mutex<()>,
    dispatcher: Arc<dyn UiDispatcher>,
}

struct State {
    song: Option<SongRef>,
    playing: bool,
    source: PlaySource,
    listeners: Vec<Arc<dyn NowPlayingListener>>,
}

impl NowPlayingState {
    /// Create an empty record delivering notifications through `dispatcher`
    pub fn new(dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    song: None,
                    playing: false,
                    source: PlaySource::default(),
                    listeners: Vec::new(),
                }),
                order: Mutex::new(()),
                dispatcher,
            }),
        }
    }

    /// Replace the current song and play flag together
    pub fn set_current_song(&self, song: Option<SongRef>, playing: bool) {
        self.commit(|state| {
            state.song = song;
            state.playing = playing;
        });
    }

    /// Update the play flag only
    pub fn set_playing(&self, playing: bool) {
        self.commit(|state| state.playing = playing);
    }

    /// Record where the current playlist came from
    pub fn set_play_source(&self, source: PlaySource) {
        self.commit(|state| state.source = source);
    }

    /// Current song
    pub fn current_song(&self) -> Option<SongRef> {
        lock(&self.inner.state).song.clone()
    }

    /// Whether audio is playing
    pub fn is_playing(&self) -> bool {
        lock(&self.inner.state).playing
    }

    /// Screen the current playlist came from
    pub fn play_source(&self) -> PlaySource {
        lock(&self.inner.state).source
    }

    /// Song, play flag and source read together
    pub fn snapshot(&self) -> NowPlayingSnapshot {
        let state = lock(&self.inner.state);
        NowPlayingSnapshot {
            song: state.song.clone(),
            playing: state.playing,
            source: state.source,
        }
    }

    /// Register a listener
    ///
    /// Returns `false` if this exact handle is already registered.
    pub fn add_listener(&self, listener: Arc<dyn NowPlayingListener>) -> bool {
        let mut state = lock(&self.inner.state);
        if state.listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        state.listeners.push(listener);
        true
    }

    /// Unregister a listener
    ///
    /// Returns `false` if the handle was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn NowPlayingListener>) -> bool {
        let mut state = lock(&self.inner.state);
        let before = state.listeners.len();
        state.listeners.retain(|l| !same_listener(l, listener));
        state.listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.state).listeners.len()
    }

    fn commit(&self, mutate: impl FnOnce(&mut State)) {
        let _order = lock(&self.inner.order);

        let (song, playing, listeners) = {
            let mut state = lock(&self.inner.state);
            mutate(&mut state);
            (state.song.clone(), state.playing, state.listeners.clone())
        };

        trace!(
            song = song.as_ref().map(|s| s.title()),
            playing,
            listeners = listeners.len(),
            "Now playing changed"
        );

        if listeners.is_empty() {
            return;
        }

        self.inner.dispatcher.dispatch(Box::new(move || {
            for listener in &listeners {
                listener.now_playing_changed(song.as_ref(), playing);
            }
        }));
    }
}

impl std::fmt::Debug for NowPlayingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("NowPlayingState")
            .field("song", &state.song.as_ref().map(|s| s.title().to_string()))
            .field("playing", &state.playing)
            .field("source", &state.source)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

// Data pointer only; vtable pointers of one type may differ across codegen units.
fn same_listener(a: &Arc<dyn NowPlayingListener>, b: &Arc<dyn NowPlayingListener>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::InlineDispatcher;
    use mellow_core::Song;

    type Seen = Arc<Mutex<Vec<(Option<String>, bool)>>>;

    fn recorder() -> (Arc<dyn NowPlayingListener>, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Arc<dyn NowPlayingListener> =
            Arc::new(move |song: Option<&SongRef>, playing: bool| {
                let title = song.map(|s| s.title().to_string());
                sink.lock().unwrap().push((title, playing));
            });
        (listener, seen)
    }

    fn state() -> NowPlayingState {
        NowPlayingState::new(Arc::new(InlineDispatcher))
    }

    #[test]
    fn starts_empty() {
        let now_playing = state();
        let snapshot = now_playing.snapshot();
        assert!(snapshot.song.is_none());
        assert!(!snapshot.playing);
        assert_eq!(snapshot.source, PlaySource::Dashboard);
    }

    #[test]
    fn every_mutation_notifies_with_full_snapshot() {
        let now_playing = state();
        let (listener, seen) = recorder();
        now_playing.add_listener(listener);

        let song = Song::builder("Blue", "/music/blue.mp3").build_ref();
        now_playing.set_current_song(Some(song), true);
        now_playing.set_playing(false);
        now_playing.set_play_source(PlaySource::LikedSongs);
        now_playing.set_current_song(None, false);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (Some("Blue".to_string()), true),
                (Some("Blue".to_string()), false),
                (Some("Blue".to_string()), false),
                (None, false),
            ]
        );
        assert_eq!(now_playing.play_source(), PlaySource::LikedSongs);
    }

    #[test]
    fn add_listener_is_idempotent() {
        let now_playing = state();
        let (listener, seen) = recorder();

        assert!(now_playing.add_listener(listener.clone()));
        assert!(!now_playing.add_listener(listener.clone()));
        assert_eq!(now_playing.listener_count(), 1);

        now_playing.set_playing(true);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn remove_listener_stops_notifications() {
        let now_playing = state();
        let (listener, seen) = recorder();
        now_playing.add_listener(listener.clone());

        assert!(now_playing.remove_listener(&listener));
        assert!(!now_playing.remove_listener(&listener));

        now_playing.set_playing(true);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let now_playing = state();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = order.clone();
            now_playing.add_listener(Arc::new(move |_: Option<&SongRef>, _: bool| {
                order.lock().unwrap().push(id);
            }));
        }

        now_playing.set_playing(true);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn clones_share_state() {
        let now_playing = state();
        let other = now_playing.clone();
        other.set_playing(true);
        assert!(now_playing.is_playing());
    }
}
