//! Mellow CLI Library
//!
//! Headless front end for the playback session: scans a music directory,
//! plays it through a `PlaybackSession`, and reads single-letter commands from
//! stdin.
//!
//! This library exposes the command loop for testing purposes.

pub mod command;
pub mod config;
pub mod error;
pub mod player;

pub use command::Command;
pub use config::{AppConfig, OutputSettings};
pub use error::{CliError, Result};
pub use player::{build_session, describe, Player};
