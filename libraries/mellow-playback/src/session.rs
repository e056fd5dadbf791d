//! Playback session
//!
//! Owns the playlist, the current index, the loop flag and the play source,
//! and decides what plays next. Every operation that reads and then changes
//! session state does so under one lock, so user navigation and the media
//! thread's end-of-song callback can never interleave halfway.

use crate::controller::PlayerController;
use crate::error::{PlaybackError, Result};
use crate::lock;
use crate::now_playing::NowPlayingState;
use crate::types::{LoadToken, PlayerConfig};
use mellow_core::{PlaySource, Song, SongRef};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, error, info, warn};

/// Handle to the playback session
///
/// Construct one at startup and pass clones to every surface that needs it.
/// Mutating operations return `Err` for rejected input; the error has already
/// been logged and session state is unchanged, so callers may ignore it.
#[derive(Clone)]
pub struct PlaybackSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: Mutex<SessionState>,
    controller: PlayerController,
    now_playing: NowPlayingState,
}

struct SessionState {
    playlist: Vec<SongRef>,
    current_index: Option<usize>,
    current_song: Option<SongRef>,
    looping: bool,
    source: PlaySource,
}

impl SessionState {
    fn valid_index(&self) -> Option<usize> {
        self.current_index.filter(|&i| i < self.playlist.len())
    }
}

impl PlaybackSession {
    /// Create the session and route the controller's end-of-song events to it
    pub fn new(controller: PlayerController, config: &PlayerConfig) -> Self {
        let now_playing = controller.now_playing().clone();
        let inner = Arc::new(SessionInner {
            state: Mutex::new(SessionState {
                playlist: Vec::new(),
                current_index: None,
                current_song: None,
                looping: config.looping,
                source: PlaySource::default(),
            }),
            controller,
            now_playing,
        });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        inner
            .controller
            .set_song_ended_handler(Arc::new(move |token: LoadToken| {
                if let Some(inner) = weak.upgrade() {
                    PlaybackSession { inner }.handle_song_ended(Some(token));
                }
            }));

        Self { inner }
    }

    /// Replace the playlist and start playing `songs[start_index]`
    ///
    /// Playlist, index and source change together, and only if the song
    /// could be handed to the controller.
    pub fn set_playlist(&self, songs: Vec<SongRef>, start_index: usize, source: PlaySource) -> Result<()> {
        if songs.is_empty() {
            warn!("Ignoring empty playlist");
            return Err(PlaybackError::EmptyPlaylist);
        }
        if start_index >= songs.len() {
            warn!(start_index, len = songs.len(), "Start index out of bounds");
            return Err(PlaybackError::IndexOutOfBounds {
                index: start_index,
                len: songs.len(),
            });
        }

        let mut state = lock(&self.inner.state);
        let song = Arc::clone(&songs[start_index]);
        if let Err(e) = self.inner.controller.play_song(&song) {
            error!(title = song.title(), error = %e, "Failed to start playlist");
            return Err(e);
        }

        info!(len = songs.len(), start_index, %source, "Playlist set");
        state.playlist = songs;
        state.current_index = Some(start_index);
        state.current_song = Some(song);
        state.source = source;
        self.inner.now_playing.set_play_source(source);
        Ok(())
    }

    /// Resume the current song, or load it fresh if it cannot be resumed
    ///
    /// No-op without a current song, including after `stop`.
    pub fn play(&self) -> Result<()> {
        let mut state = lock(&self.inner.state);
        self.play_locked(&mut state)
    }

    /// Pause the current song
    pub fn pause(&self) -> Result<()> {
        let state = lock(&self.inner.state);
        Self::pause_locked(&self.inner.controller, &state)
    }

    /// Pause if playing, play otherwise
    pub fn toggle_play_pause(&self) -> Result<()> {
        let mut state = lock(&self.inner.state);
        if self.inner.now_playing.is_playing() {
            Self::pause_locked(&self.inner.controller, &state)
        } else {
            self.play_locked(&mut state)
        }
    }

    /// Play the next song, wrapping to the start
    pub fn play_next(&self) -> Result<()> {
        let mut state = lock(&self.inner.state);
        self.advance_locked(&mut state)
    }

    /// Play the previous song, wrapping to the end
    pub fn play_previous(&self) -> Result<()> {
        let mut state = lock(&self.inner.state);
        let Some(index) = state.valid_index() else {
            debug!("No playlist to go back in");
            return Ok(());
        };
        let len = state.playlist.len();
        self.start_locked(&mut state, (index + len - 1) % len)
    }

    /// Flip loop mode and return the new value
    ///
    /// Does not touch what is currently loaded.
    pub fn toggle_loop(&self) -> bool {
        let mut state = lock(&self.inner.state);
        state.looping = !state.looping;
        info!(looping = state.looping, "Loop toggled");
        state.looping
    }

    /// Stop playback; the playlist and index are kept
    pub fn stop(&self) -> Result<()> {
        let mut state = lock(&self.inner.state);
        self.inner.controller.stop_song()?;
        state.current_song = None;
        Ok(())
    }

    /// Apply the end-of-song policy: loop, else advance, else nothing
    ///
    /// The controller calls this automatically when a load plays through;
    /// calling it directly behaves as if the current song just ended.
    pub fn on_song_ended(&self) {
        self.handle_song_ended(None);
    }

    /// Whether `song` is the current song and audibly playing
    pub fn is_playing(&self, song: &Song) -> bool {
        let state = lock(&self.inner.state);
        state.current_song.as_deref() == Some(song) && self.inner.now_playing.is_playing()
    }

    /// Current song
    pub fn current_song(&self) -> Option<SongRef> {
        lock(&self.inner.state).current_song.clone()
    }

    /// Copy of the playlist
    pub fn playlist(&self) -> Vec<SongRef> {
        lock(&self.inner.state).playlist.clone()
    }

    /// Index of the current song in the playlist
    pub fn current_index(&self) -> Option<usize> {
        lock(&self.inner.state).current_index
    }

    /// Whether loop mode is on
    pub fn is_looping(&self) -> bool {
        lock(&self.inner.state).looping
    }

    /// Screen the playlist came from
    pub fn play_source(&self) -> PlaySource {
        lock(&self.inner.state).source
    }

    /// Set output volume (clamped to 0.0-1.0)
    pub fn set_volume(&self, volume: f32) {
        self.inner.controller.set_volume(volume);
    }

    /// Current output volume
    pub fn volume(&self) -> f32 {
        self.inner.controller.volume()
    }

    /// Now-playing record to subscribe to
    pub fn now_playing(&self) -> &NowPlayingState {
        &self.inner.now_playing
    }

    /// Controller driving the transport
    pub fn controller(&self) -> &PlayerController {
        &self.inner.controller
    }

    fn handle_song_ended(&self, token: Option<LoadToken>) {
        let mut state = lock(&self.inner.state);

        if let Some(token) = token {
            if !self.inner.controller.is_current_load(token) {
                debug!(%token, "Song ended event superseded");
                return;
            }
        }

        let result = match state.valid_index() {
            Some(index) if state.looping && state.current_song.is_some() => {
                debug!(index, "Looping current song");
                self.start_locked(&mut state, index)
            }
            Some(_) => self.advance_locked(&mut state),
            None => {
                debug!("Song ended with nothing to advance to");
                Err(PlaybackError::NoCurrentSong)
            }
        };

        if result.is_err() {
            self.inner.controller.settle_ended();
        }
    }

    fn play_locked(&self, state: &mut SessionState) -> Result<()> {
        let (Some(index), true) = (state.valid_index(), state.current_song.is_some()) else {
            debug!("No current song to play");
            return Ok(());
        };

        let resumable = state
            .current_song
            .as_ref()
            .is_some_and(|song| self.inner.controller.can_resume(song));
        if resumable {
            self.inner.controller.resume_song()
        } else {
            self.start_locked(state, index)
        }
    }

    fn pause_locked(controller: &PlayerController, state: &SessionState) -> Result<()> {
        if state.current_song.is_none() {
            debug!("Nothing to pause");
            return Ok(());
        }
        controller.pause_song()
    }

    fn advance_locked(&self, state: &mut SessionState) -> Result<()> {
        let Some(index) = state.valid_index() else {
            debug!("No playlist to advance in");
            return Ok(());
        };
        let next = (index + 1) % state.playlist.len();
        self.start_locked(state, next)
    }

    /// Fresh load of `playlist[index]`; state moves only if the load was issued
    fn start_locked(&self, state: &mut SessionState, index: usize) -> Result<()> {
        let song = Arc::clone(&state.playlist[index]);
        if let Err(e) = self.inner.controller.play_song(&song) {
            error!(index, title = song.title(), error = %e, "Failed to play song");
            return Err(e);
        }
        state.current_index = Some(index);
        state.current_song = Some(song);
        Ok(())
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("PlaybackSession")
            .field("len", &state.playlist.len())
            .field("current_index", &state.current_index)
            .field("looping", &state.looping)
            .field("source", &state.source)
            .finish_non_exhaustive()
    }
}
