//! Play event model

use serde::{Deserialize, Serialize};

/// One track having been played, as returned by extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub track_name: String,
    /// First listed artist
    pub artist_name: String,
    pub album_name: String,
    /// Public web link to the track
    #[serde(default)]
    pub track_url: String,
    /// Provider timestamp string, ISO-8601
    pub played_at: String,
}

impl PlayEvent {
    pub fn new(
        track_name: impl Into<String>,
        artist_name: impl Into<String>,
        album_name: impl Into<String>,
        track_url: impl Into<String>,
        played_at: impl Into<String>,
    ) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            album_name: album_name.into(),
            track_url: track_url.into(),
            played_at: played_at.into(),
        }
    }

    /// Whether the event was played on the given `YYYY-MM-DD` day
    pub fn played_on(&self, date: &str) -> bool {
        self.played_at.starts_with(date)
    }
}
