//! Mellow Player - Playback Session Coordination
//!
//! Owns "what song is playing, where, for whom, and why" and keeps it
//! consistent while a media thread reports asynchronous completion and any
//! number of UI surfaces read and mutate playback state.
//!
//! This crate provides:
//! - `PlaybackSession`: playlist, current index, loop flag, play source, and
//!   the next/previous/auto-advance policy
//! - `PlayerController`: sole owner of the `Transport`, serializing every
//!   transport operation onto one media thread
//! - `NowPlayingState`: observable `(song, playing)` projection for the UI
//! - `UiDispatcher`: the single injected hook used to deliver notifications
//! - `LikeService`: like/unlike round trips through a `LikedSongStore`
//!
//! # Architecture
//!
//! `mellow-playback` does not know about any GUI toolkit, database or audio
//! backend:
//! - Audio output is a `Transport` built on the media thread by a factory
//! - Persistence sits behind `mellow_core::LikedSongStore`
//! - UI thread marshaling sits behind `UiDispatcher`
//!
//! The `desktop` feature adds `CpalTransport` (symphonia decode, cpal output).
//!
//! # Example
//!
//! ```rust,no_run
//! use mellow_core::{PlaySource, Song};
//! use mellow_playback::{
//!     InlineDispatcher, NowPlayingState, PlaybackSession, PlayerConfig, PlayerController,
//!     SilentTransport,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> mellow_playback::Result<()> {
//! let config = PlayerConfig::default();
//! let now_playing = NowPlayingState::new(Arc::new(InlineDispatcher));
//!
//! let controller = PlayerController::spawn(&config, now_playing.clone(), || {
//!     Ok(SilentTransport::new(Duration::from_secs(3)))
//! })?;
//! let session = PlaybackSession::new(controller, &config);
//!
//! now_playing.add_listener(Arc::new(|song: Option<&mellow_core::SongRef>, playing: bool| {
//!     println!("now playing: {:?} ({playing})", song.map(|s| s.title().to_string()));
//! }));
//!
//! let songs = vec![
//!     Song::builder("Intro", "/music/intro.mp3").build_ref(),
//!     Song::builder("Outro", "/music/outro.mp3").build_ref(),
//! ];
//! session.set_playlist(songs, 0, PlaySource::AllSongs)?;
//! session.play_next()?;
//! session.toggle_loop();
//! # Ok(())
//! # }
//! ```

mod controller;
#[cfg(feature = "desktop")]
mod desktop;
mod dispatch;
mod error;
mod likes;
mod now_playing;
mod session;
mod transport;
pub mod types;

pub use controller::{PlayerController, SongEndedHandler};
#[cfg(feature = "desktop")]
pub use desktop::CpalTransport;
pub use dispatch::{InlineDispatcher, ThreadDispatcher, UiDispatcher, UiTask};
pub use error::{PlaybackError, Result};
pub use likes::{LikeService, LikedSongsListener};
pub use now_playing::{NowPlayingListener, NowPlayingSnapshot, NowPlayingState};
pub use session::PlaybackSession;
pub use transport::{SilentTransport, Transport};
pub use types::{LoadToken, PlayerConfig};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a panicking thread poisoned it
///
/// Every critical section in this crate leaves its state consistent before
/// anything that can panic (listener callbacks run outside the locks), so the
/// inner value is still valid after a poison.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
