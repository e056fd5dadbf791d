//! Platform-agnostic audio transport trait
//!
//! Abstracts the decode/output engine for one file at a time (cpal on
//! desktop, a silent clock on headless hosts, mocks in tests).

use crate::error::{PlaybackError, Result};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opaque audio decode/output unit
///
/// A transport is built by a factory on the media thread and never leaves
/// it, so implementations need not be `Send` (cpal streams are not on every
/// platform). The controller is the only caller.
pub trait Transport {
    /// Load a file, replacing and releasing anything loaded before
    ///
    /// Loading does not start output; the controller calls `play` next.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Start (or restart after `load`) output
    fn play(&mut self) -> Result<()>;

    /// Pause output, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Continue output from the paused position
    fn resume(&mut self) -> Result<()> {
        self.play()
    }

    /// Silence output and release the loaded file
    fn stop(&mut self);

    /// Set output volume (already clamped to 0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// Whether the loaded file played through to its natural end
    ///
    /// Polled by the media thread while playing. Must stay `false` after
    /// `stop` and before the first `load`.
    fn is_finished(&self) -> bool;
}

/// Transport that plays nothing and finishes after a fixed length
///
/// Lets the whole session run on hosts without an audio device (CI,
/// headless servers). Paused time does not count towards the length.
#[derive(Debug)]
pub struct SilentTransport {
    length: Duration,
    loaded: bool,
    played: Duration,
    started_at: Option<Instant>,
    volume: f32,
}

impl SilentTransport {
    /// Create a transport whose every song lasts `length`
    pub fn new(length: Duration) -> Self {
        Self {
            length,
            loaded: false,
            played: Duration::ZERO,
            started_at: None,
            volume: 1.0,
        }
    }

    /// Current volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn elapsed(&self) -> Duration {
        self.played + self.started_at.map(|at| at.elapsed()).unwrap_or_default()
    }
}

impl Transport for SilentTransport {
    fn load(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PlaybackError::FileNotFound(path.to_path_buf()));
        }
        self.loaded = true;
        self.played = Duration::ZERO;
        self.started_at = None;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if !self.loaded {
            return Err(PlaybackError::transport("nothing loaded"));
        }
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(at) = self.started_at.take() {
            self.played += at.elapsed();
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.loaded = false;
        self.played = Duration::ZERO;
        self.started_at = None;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn is_finished(&self) -> bool {
        self.loaded && self.elapsed() >= self.length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn temp_song() -> tempfile::NamedTempFile {
        tempfile::NamedTempFile::new().unwrap()
    }

    #[test]
    fn finishes_after_length() {
        let file = temp_song();
        let mut transport = SilentTransport::new(Duration::from_millis(20));
        transport.load(file.path()).unwrap();
        transport.play().unwrap();
        assert!(!transport.is_finished());

        thread::sleep(Duration::from_millis(40));
        assert!(transport.is_finished());
    }

    #[test]
    fn paused_time_does_not_count() {
        let file = temp_song();
        let mut transport = SilentTransport::new(Duration::from_millis(30));
        transport.load(file.path()).unwrap();
        transport.play().unwrap();
        transport.pause().unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(!transport.is_finished());
    }

    #[test]
    fn stop_clears_finished() {
        let file = temp_song();
        let mut transport = SilentTransport::new(Duration::ZERO);
        transport.load(file.path()).unwrap();
        transport.play().unwrap();
        assert!(transport.is_finished());

        transport.stop();
        assert!(!transport.is_finished());
    }

    #[test]
    fn missing_file_fails_to_load() {
        let mut transport = SilentTransport::new(Duration::from_secs(1));
        let result = transport.load(Path::new("/nonexistent/song.mp3"));
        assert!(matches!(result, Err(PlaybackError::FileNotFound(_))));
        assert!(transport.play().is_err());
    }
}
