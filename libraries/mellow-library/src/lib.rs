//! Mellow Player Library
//!
//! Song discovery and lookup for Mellow Player.
//!
//! This crate provides:
//! - Tag reading from audio files (MP3, FLAC, WAV by default)
//! - Recursive library scanning
//! - An in-memory catalog with LRU-cached search (implements `SongSource`)
//! - An in-memory `LikedSongStore`
//!
//! # Example
//!
//! ```rust,no_run
//! use mellow_library::{LibraryConfig, SongCatalog};
//! use std::path::Path;
//! # fn main() -> mellow_library::Result<()> {
//! let catalog = SongCatalog::new(&LibraryConfig::default());
//! let found = catalog.load(Path::new("/music"))?;
//!
//! for song in catalog.search("miles blue").iter() {
//!     println!("{} - {}", song.artist(), song.title());
//! }
//! # let _ = found;
//! # Ok(())
//! # }
//! ```

mod catalog;
mod config;
mod error;
mod liked_store;
mod reader;
mod scanner;

pub use catalog::SongCatalog;
pub use config::LibraryConfig;
pub use error::{LibraryError, Result};
pub use liked_store::InMemoryLikedStore;
pub use reader::{SongTags, TagReader, UNKNOWN};
pub use scanner::LibraryScanner;
