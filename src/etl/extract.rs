//! Extract today's plays from the streaming API

use chrono::NaiveDate;
use tracing::{error, info};

use crate::errors::ExtractionError;
use crate::models::PlayEvent;
use crate::spotify::{RecentlyPlayedSource, TokenManager};
use crate::utils::dates::{day_prefix, today_utc};

/// Keep only events played on `date`, preserving provider order
pub fn filter_played_on(events: Vec<PlayEvent>, date: NaiveDate) -> Vec<PlayEvent> {
    let prefix = day_prefix(date);
    events
        .into_iter()
        .filter(|event| event.played_on(&prefix))
        .collect()
}

/// Pulls recent plays using a run-scoped token manager
pub struct Extractor<'a> {
    tokens: &'a TokenManager,
    source: &'a dyn RecentlyPlayedSource,
    limit: u32,
}

impl<'a> Extractor<'a> {
    pub fn new(tokens: &'a TokenManager, source: &'a dyn RecentlyPlayedSource, limit: u32) -> Self {
        Self {
            tokens,
            source,
            limit,
        }
    }

    /// Fetch the last `limit` plays and keep those from the current UTC day
    pub async fn extract_recent(&self) -> Result<Vec<PlayEvent>, ExtractionError> {
        self.extract_recent_on(today_utc()).await
    }

    pub async fn extract_recent_on(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<PlayEvent>, ExtractionError> {
        let result = self.fetch(today).await;
        if let Err(e) = &result {
            error!("Error extracting data from Spotify: {}", e);
        }
        result
    }

    async fn fetch(&self, today: NaiveDate) -> Result<Vec<PlayEvent>, ExtractionError> {
        let access_token = self.tokens.get_access_token().await?;
        let events = self
            .source
            .recently_played(&access_token, self.limit)
            .await?;
        let fetched = events.len();

        let events = filter_played_on(events, today);
        info!(
            "Retrieved {} tracks from Spotify ({} played on {})",
            fetched,
            events.len(),
            today
        );

        Ok(events)
    }
}
