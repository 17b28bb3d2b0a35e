//! Song model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::composite_id;

/// A song row, keyed by `<name>_<artist>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SongRecord {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub played_at: DateTime<Utc>,
}

impl SongRecord {
    pub fn new(name: &str, artist: &str, album: &str, played_at: DateTime<Utc>) -> Self {
        Self {
            id: composite_id(name, artist),
            name: name.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            played_at,
        }
    }
}
