//! Core types for playback coordination

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of one load issued to the transport
///
/// Every fresh load gets a new, strictly increasing token. "Finished" events
/// carry the token of the load that finished, so an event whose token is no
/// longer the controller's current load is stale and gets dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

impl LoadToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw counter value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load#{}", self.0)
    }
}

/// Configuration for the controller and session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Initial output volume (0.0-1.0, default: 1.0)
    pub initial_volume: f32,

    /// How often the media thread checks for end of media (default: 50ms)
    pub poll_interval_ms: u64,

    /// Start with loop mode on (default: false)
    pub looping: bool,
}

impl PlayerConfig {
    /// Poll interval as a `Duration` (never zero)
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: 1.0,
            poll_interval_ms: 50,
            looping: false,
        }
    }
}

/// Clamp a volume into `[0.0, 1.0]`, treating NaN as silence
pub(crate) fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
