//! Player controller
//!
//! Sole owner of the `Transport`. Every transport operation runs on one
//! dedicated media thread fed by an unbounded command queue, so callers never
//! block on audio work. The controller mirrors transport lifecycle into
//! `NowPlayingState` and forwards natural end-of-song to whoever installed a
//! `SongEndedHandler` (the session); it never decides what plays next.

use crate::error::{PlaybackError, Result};
use crate::lock;
use crate::now_playing::NowPlayingState;
use crate::transport::Transport;
use crate::types::{clamp_volume, LoadToken, PlayerConfig};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use mellow_core::{Song, SongRef};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Callback for "the current load played to its end"
///
/// Runs on the media thread. It may call back into the controller, but must
/// not call [`PlayerController::sync`].
pub type SongEndedHandler = Arc<dyn Fn(LoadToken) + Send + Sync>;

const SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Commands sent to the media thread
enum MediaCommand {
    Load { token: LoadToken, path: PathBuf },
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
    Sync(Sender<()>),
    Shutdown,
}

struct LoadedSong {
    song: SongRef,
    token: LoadToken,
    /// Played through or failed; cannot be resumed
    ended: bool,
}

struct ControllerState {
    loaded: Option<LoadedSong>,
    playing: bool,
    volume: f32,
    last_token: u64,
    load_count: u64,
}

/// State reachable from both the caller side and the media thread
struct Shared {
    state: Mutex<ControllerState>,
    on_song_ended: Mutex<Option<SongEndedHandler>>,
    now_playing: NowPlayingState,
}

impl Shared {
    fn song_finished(&self, token: LoadToken) {
        {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            match state.loaded.as_mut() {
                Some(loaded) if loaded.token == token => {
                    loaded.ended = true;
                    state.playing = false;
                }
                _ => {
                    debug!(%token, "Ignoring stale finished event");
                    return;
                }
            }
        }

        debug!(%token, "Song finished");
        let handler = lock(&self.on_song_ended).clone();
        match handler {
            Some(handler) => handler(token),
            None => self.settle_ended(),
        }
    }

    fn load_failed(&self, token: LoadToken) {
        let mut guard = lock(&self.state);
        let state = &mut *guard;
        match state.loaded.as_mut() {
            Some(loaded) if loaded.token == token => {
                loaded.ended = true;
                state.playing = false;
                self.now_playing.set_playing(false);
            }
            _ => debug!(%token, "Ignoring failure of superseded load"),
        }
    }

    fn settle_ended(&self) {
        let mut state = lock(&self.state);
        if state.loaded.as_ref().is_some_and(|l| l.ended) {
            state.playing = false;
            self.now_playing.set_playing(false);
        }
    }
}

/// Media-thread side: owns the transport
struct MediaLoop<T> {
    transport: T,
    shared: Arc<Shared>,
    active: Option<LoadToken>,
    playing: bool,
}

impl<T: Transport> MediaLoop<T> {
    fn run(mut self, commands: &Receiver<MediaCommand>, poll: Duration) {
        loop {
            match commands.recv_timeout(poll) {
                Ok(MediaCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
            }
            self.check_finished();
        }

        self.transport.stop();
        debug!("Media thread exiting");
    }

    fn handle(&mut self, command: MediaCommand) {
        match command {
            MediaCommand::Load { token, path } => {
                self.transport.stop();
                self.active = None;
                self.playing = false;

                let started = self.transport.load(&path).and_then(|()| self.transport.play());
                match started {
                    Ok(()) => {
                        debug!(%token, path = %path.display(), "Loaded");
                        self.active = Some(token);
                        self.playing = true;
                    }
                    Err(e) => {
                        error!(%token, path = %path.display(), error = %e, "Failed to start playback");
                        self.transport.stop();
                        self.shared.load_failed(token);
                    }
                }
            }
            MediaCommand::Pause => {
                if self.playing {
                    if let Err(e) = self.transport.pause() {
                        warn!(error = %e, "Transport failed to pause");
                    }
                    self.playing = false;
                }
            }
            MediaCommand::Resume => {
                if let (Some(token), false) = (self.active, self.playing) {
                    match self.transport.resume() {
                        Ok(()) => self.playing = true,
                        Err(e) => {
                            error!(%token, error = %e, "Failed to resume playback");
                            self.transport.stop();
                            self.active = None;
                            self.shared.load_failed(token);
                        }
                    }
                }
            }
            MediaCommand::Stop => {
                self.transport.stop();
                self.active = None;
                self.playing = false;
            }
            MediaCommand::SetVolume(volume) => self.transport.set_volume(volume),
            MediaCommand::Sync(done) => {
                self.check_finished();
                done.send(()).ok();
            }
            MediaCommand::Shutdown => {}
        }
    }

    fn check_finished(&mut self) {
        if !self.playing || !self.transport.is_finished() {
            return;
        }
        self.playing = false;
        if let Some(token) = self.active.take() {
            self.shared.song_finished(token);
        }
    }
}

/// Owns the transport through its media thread
///
/// Dropping the controller shuts the media thread down and joins it.
pub struct PlayerController {
    shared: Arc<Shared>,
    commands: Sender<MediaCommand>,
    media_thread: Option<JoinHandle<()>>,
}

impl PlayerController {
    /// Start the media thread and build the transport on it
    ///
    /// `factory` runs on the media thread, so the transport itself does not
    /// have to be `Send`. A factory error is returned here.
    pub fn spawn<T, F>(config: &PlayerConfig, now_playing: NowPlayingState, factory: F) -> Result<Self>
    where
        T: Transport + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let volume = clamp_volume(config.initial_volume);
        let poll = config.poll_interval();

        let shared = Arc::new(Shared {
            state: Mutex::new(ControllerState {
                loaded: None,
                playing: false,
                volume,
                last_token: 0,
                load_count: 0,
            }),
            on_song_ended: Mutex::new(None),
            now_playing,
        });

        let (commands, queue) = unbounded::<MediaCommand>();
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let thread_shared = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name("mellow-media".to_string())
            .spawn(move || {
                let mut transport = match factory() {
                    Ok(transport) => transport,
                    Err(e) => {
                        ready_tx.send(Err(e)).ok();
                        return;
                    }
                };
                transport.set_volume(volume);
                ready_tx.send(Ok(())).ok();

                MediaLoop {
                    transport,
                    shared: thread_shared,
                    active: None,
                    playing: false,
                }
                .run(&queue, poll);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(error = %e, "Failed to create transport");
                handle.join().ok();
                return Err(e);
            }
            Err(_) => {
                error!("Media thread died while creating transport");
                handle.join().ok();
                return Err(PlaybackError::MediaThreadUnavailable);
            }
        }

        info!(volume, ?poll, "Media thread started");

        Ok(Self {
            shared,
            commands,
            media_thread: Some(handle),
        })
    }

    /// Release whatever is loaded, then load and start `song`
    ///
    /// The path is checked before anything changes; a blank path or missing
    /// file is an error and leaves playback untouched. Decode failures
    /// surface later, on the media thread, as a cleared play flag.
    pub fn play_song(&self, song: &SongRef) -> Result<()> {
        validate_path(song)?;

        let mut state = lock(&self.shared.state);
        let token = LoadToken::new(state.last_token + 1);
        self.send(MediaCommand::Load {
            token,
            path: song.path().to_path_buf(),
        })?;

        state.last_token = token.get();
        state.load_count += 1;
        state.loaded = Some(LoadedSong {
            song: Arc::clone(song),
            token,
            ended: false,
        });
        state.playing = true;
        self.shared.now_playing.set_current_song(Some(Arc::clone(song)), true);

        info!(%token, title = song.title(), "Playing");
        Ok(())
    }

    /// Pause output; no-op unless something is playing
    pub fn pause_song(&self) -> Result<()> {
        let mut state = lock(&self.shared.state);
        if state.loaded.is_none() || !state.playing {
            debug!("Nothing playing to pause");
            return Ok(());
        }

        self.send(MediaCommand::Pause)?;
        state.playing = false;
        self.shared.now_playing.set_playing(false);
        debug!("Paused");
        Ok(())
    }

    /// Continue the paused load; no-op if nothing resumable is loaded
    pub fn resume_song(&self) -> Result<()> {
        let mut guard = lock(&self.shared.state);
        let state = &mut *guard;
        let song = match &state.loaded {
            Some(loaded) if !loaded.ended => Arc::clone(&loaded.song),
            _ => {
                debug!("Nothing to resume");
                return Ok(());
            }
        };
        if state.playing {
            return Ok(());
        }

        self.send(MediaCommand::Resume)?;
        state.playing = true;
        self.shared.now_playing.set_current_song(Some(song), true);
        debug!("Resumed");
        Ok(())
    }

    /// Stop output and forget the current load
    ///
    /// A finished event still in flight for the stopped load is ignored.
    pub fn stop_song(&self) -> Result<()> {
        let mut state = lock(&self.shared.state);
        if state.loaded.is_none() {
            debug!("Nothing loaded to stop");
            return Ok(());
        }

        self.send(MediaCommand::Stop)?;
        state.loaded = None;
        state.playing = false;
        self.shared.now_playing.set_current_song(None, false);
        info!("Stopped");
        Ok(())
    }

    /// Set output volume, clamped to 0.0-1.0
    pub fn set_volume(&self, volume: f32) {
        let volume = clamp_volume(volume);
        lock(&self.shared.state).volume = volume;
        if self.send(MediaCommand::SetVolume(volume)).is_err() {
            warn!(volume, "Volume change not delivered");
        }
    }

    /// Current volume
    pub fn volume(&self) -> f32 {
        lock(&self.shared.state).volume
    }

    /// Song of the current load, if any (also after it ended)
    pub fn current_song(&self) -> Option<SongRef> {
        lock(&self.shared.state).loaded.as_ref().map(|l| Arc::clone(&l.song))
    }

    /// Whether the transport is playing as far as the controller knows
    pub fn is_playing(&self) -> bool {
        lock(&self.shared.state).playing
    }

    /// Whether `song` is loaded and can continue from its position
    pub fn can_resume(&self, song: &Song) -> bool {
        lock(&self.shared.state)
            .loaded
            .as_ref()
            .is_some_and(|l| !l.ended && *l.song == *song)
    }

    /// Token of the current load
    pub fn current_load(&self) -> Option<LoadToken> {
        lock(&self.shared.state).loaded.as_ref().map(|l| l.token)
    }

    /// Whether `token` still identifies the current load
    pub fn is_current_load(&self, token: LoadToken) -> bool {
        self.current_load() == Some(token)
    }

    /// Number of fresh loads issued so far
    pub fn load_count(&self) -> u64 {
        lock(&self.shared.state).load_count
    }

    /// Install the end-of-song callback, replacing any previous one
    pub fn set_song_ended_handler(&self, handler: SongEndedHandler) {
        *lock(&self.shared.on_song_ended) = Some(handler);
    }

    /// Now-playing record this controller publishes to
    pub fn now_playing(&self) -> &NowPlayingState {
        &self.shared.now_playing
    }

    /// Block until the media thread has handled every command queued so far
    ///
    /// Any end-of-song already detected is delivered before this returns.
    /// Must not be called from the media thread.
    pub fn sync(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded(1);
        self.send(MediaCommand::Sync(done_tx))?;
        done_rx
            .recv_timeout(SYNC_TIMEOUT)
            .map_err(|_| PlaybackError::MediaThreadUnavailable)
    }

    /// Publish "not playing" after an ended load that nothing replaced
    pub(crate) fn settle_ended(&self) {
        self.shared.settle_ended();
    }

    fn send(&self, command: MediaCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| {
            error!("Media thread is gone");
            PlaybackError::MediaThreadUnavailable
        })
    }
}

impl std::fmt::Debug for PlayerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.shared.state);
        f.debug_struct("PlayerController")
            .field("current_load", &state.loaded.as_ref().map(|l| l.token))
            .field("playing", &state.playing)
            .field("volume", &state.volume)
            .finish_non_exhaustive()
    }
}

impl Drop for PlayerController {
    fn drop(&mut self) {
        self.commands.send(MediaCommand::Shutdown).ok();
        if let Some(handle) = self.media_thread.take() {
            // The last session handle can be released by the song-ended
            // callback, which runs on the media thread.
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                error!("Media thread panicked");
            }
        }
    }
}

fn validate_path(song: &Song) -> Result<()> {
    let path = song.path();
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        warn!(title = song.title(), "Song has no file path");
        return Err(PlaybackError::InvalidPath);
    }
    if !path.exists() {
        warn!(title = song.title(), path = %path.display(), "Audio file not found");
        return Err(PlaybackError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}
