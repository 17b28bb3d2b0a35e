//! Data models for the ETL job
//!
//! Play events come out of extraction; songs and albums are what gets loaded.

mod album;
mod credential;
mod play_event;
mod song;

pub use album::AlbumRecord;
pub use credential::{AccessCredential, TokenGrant};
pub use play_event::PlayEvent;
pub use song::SongRecord;

/// Composite key shared by songs and albums: `<name>_<artist>`
pub fn composite_id(name: &str, artist: &str) -> String {
    format!("{}_{}", name, artist)
}
