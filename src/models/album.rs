//! Album model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::composite_id;

/// An album row, keyed by `<album>_<artist>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AlbumRecord {
    pub id: String,
    pub name: String,
    pub artist: String,
    /// Date the album was first seen, not its real release date
    pub release_date: NaiveDate,
}

impl AlbumRecord {
    pub fn new(name: &str, artist: &str, release_date: NaiveDate) -> Self {
        Self {
            id: composite_id(name, artist),
            name: name.to_string(),
            artist: artist.to_string(),
            release_date,
        }
    }
}
