//! Mellow Player Core
//!
//! Domain types, collaborator traits, and error handling shared by every
//! Mellow Player crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Song`, `SongId`, `UserId`, `PlaySource`
//! - **Collaborator Traits**: `SongSource`, `LikedSongStore`
//! - **Error Handling**: `MellowError` and `Result`
//!
//! # Example
//!
//! ```rust
//! use mellow_core::{PlaySource, Song, SongId};
//! use std::time::Duration;
//!
//! let song = Song::builder("Blue in Green", "/music/kind_of_blue/03.flac")
//!     .artist("Miles Davis")
//!     .album("Kind of Blue")
//!     .duration(Duration::from_secs(337))
//!     .id(SongId::new(3))
//!     .build();
//!
//! assert_eq!(song.artist(), "Miles Davis");
//! assert!(!song.is_liked());
//! assert_eq!(PlaySource::LikedSongs.screen_name(), "likedsong");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{MellowError, Result};
pub use traits::{LikedSongStore, SongSource};
pub use types::{PlaySource, Song, SongBuilder, SongId, SongRef, UserId};
