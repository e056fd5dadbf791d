/// Domain types for Mellow Player
mod ids;
mod play_source;
mod song;

pub use ids::{SongId, UserId};
pub use play_source::PlaySource;
pub use song::{Song, SongBuilder, SongRef};
