//! Pipeline orchestration
//!
//! Runs extract, transform and load strictly in sequence. A failed run is
//! retried as a whole; nothing is resumed mid-way.

pub mod payload;
pub mod schedule;

use chrono::NaiveDate;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::EtlConfig;
use crate::db::DbEngine;
use crate::errors::EtlError;
use crate::etl::{transform_on, Extractor, LoadReport, Loader};
use crate::spotify::{RecentlyPlayedSource, SpotifyClient, TokenManager};
use crate::utils::dates::today_utc;

/// What a successful run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub extracted: usize,
    pub report: LoadReport,
}

/// One extract → transform → load pass
pub async fn run_once(
    tokens: &TokenManager,
    source: &dyn RecentlyPlayedSource,
    db: &DbEngine,
    limit: u32,
    today: NaiveDate,
) -> Result<RunOutcome, EtlError> {
    info!("Starting extraction process...");
    let events = Extractor::new(tokens, source, limit)
        .extract_recent_on(today)
        .await?;

    info!("Starting transformation process...");
    let transformed = transform_on(&events, today)?;

    info!("Starting load process...");
    let report = Loader::new(db)
        .load(&transformed.songs, &transformed.albums)
        .await?;

    Ok(RunOutcome {
        extracted: events.len(),
        report,
    })
}

/// Run `attempt` once, then up to `retries` more times after failures
pub async fn with_retries<T, F, Fut>(
    retries: u32,
    delay: Duration,
    mut attempt: F,
) -> Result<T, EtlError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, EtlError>>,
{
    let mut n = 0;
    loop {
        match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(e) if n < retries => {
                n += 1;
                warn!(
                    "Run failed in {} stage: {}. Retrying in {:?} ({}/{})",
                    e.stage(),
                    e,
                    delay,
                    n,
                    retries
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!("Run failed in {} stage: {}", e.stage(), e);
                return Err(e);
            }
        }
    }
}

/// Everything a run needs that outlives a single run
pub struct Pipeline {
    config: EtlConfig,
    http: Client,
    db: DbEngine,
}

impl Pipeline {
    pub fn new(config: EtlConfig, http: Client, db: DbEngine) -> Self {
        Self { config, http, db }
    }

    /// Run the pipeline for today with the configured retry policy
    pub async fn run(&self) -> Result<RunOutcome, EtlError> {
        let outcome = with_retries(self.config.retries, self.config.retry_delay(), |attempt| {
            self.attempt(attempt)
        })
        .await?;

        info!(
            "Run complete: {} plays extracted, main now holds {} songs and {} albums",
            outcome.extracted, outcome.report.main_songs, outcome.report.main_albums
        );
        Ok(outcome)
    }

    async fn attempt(&self, attempt: u32) -> Result<RunOutcome, EtlError> {
        if attempt > 0 {
            info!("Attempt {}", attempt + 1);
        }
        // a fresh token manager per run; nothing carries over
        let tokens = TokenManager::from_config(self.http.clone(), &self.config);
        let source = SpotifyClient::new(self.http.clone(), &self.config);
        run_once(
            &tokens,
            &source,
            &self.db,
            self.config.recent_limit,
            today_utc(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AlbumTable, Schema, SongTable};
    use crate::errors::{AuthError, ExtractionError, LoadError, TransformError};
    use crate::models::{PlayEvent, TokenGrant};
    use crate::spotify::TokenExchange;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct StaticExchange;

    #[async_trait]
    impl TokenExchange for StaticExchange {
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, AuthError> {
            Ok(TokenGrant {
                access_token: "access".to_string(),
                expires_in: 3600,
                token_type: None,
                scope: None,
                refresh_token: None,
            })
        }
    }

    struct FixedSource(Vec<PlayEvent>);

    #[async_trait]
    impl RecentlyPlayedSource for FixedSource {
        async fn recently_played(
            &self,
            _access_token: &str,
            limit: u32,
        ) -> Result<Vec<PlayEvent>, ExtractionError> {
            Ok(self.0.iter().take(limit as usize).cloned().collect())
        }
    }

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_run_once_lands_today_only() {
        let source = FixedSource(vec![
            PlayEvent::new("Song A", "Artist X", "Album Y", "", "2024-06-01T10:00:00.000Z"),
            PlayEvent::new("Song B", "Artist X", "Album Y", "", "2024-06-01T09:00:00.000Z"),
            PlayEvent::new("Song C", "Artist Z", "Album W", "", "2024-06-01T08:00:00.000Z"),
            PlayEvent::new("Song D", "Artist Z", "Album W", "", "2024-05-31T23:00:00.000Z"),
        ]);
        let tokens = TokenManager::new(Box::new(StaticExchange), "refresh");
        let db = DbEngine::in_memory().await.unwrap();

        let outcome = run_once(&tokens, &source, &db, 50, june_first())
            .await
            .unwrap();

        assert_eq!(outcome.extracted, 3);
        assert_eq!(outcome.report.main_songs, 3);
        assert_eq!(outcome.report.main_albums, 2);

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(SongTable::count(&mut conn, Schema::Staging).await.unwrap(), 3);
        assert_eq!(AlbumTable::count(&mut conn, Schema::Staging).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_run_once_stops_on_bad_event() {
        let source = FixedSource(vec![PlayEvent::new(
            "Song A",
            "",
            "Album Y",
            "",
            "2024-06-01T10:00:00.000Z",
        )]);
        let tokens = TokenManager::new(Box::new(StaticExchange), "refresh");
        let db = DbEngine::in_memory().await.unwrap();

        let err = run_once(&tokens, &source, &db, 50, june_first())
            .await
            .unwrap_err();
        assert!(matches!(err, EtlError::Transform(_)));
    }

    #[tokio::test]
    async fn test_retry_once_then_succeed() {
        let calls = AtomicU32::new(0);

        let result = with_retries(1, Duration::ZERO, |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(EtlError::Load(LoadError::Database(sqlx::Error::PoolTimedOut)))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_one_retry() {
        let calls = AtomicU32::new(0);

        let result: Result<(), EtlError> = with_retries(1, Duration::ZERO, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(EtlError::Transform(TransformError::MissingField {
                    index: 0,
                    field: "track_name",
                }))
            }
        })
        .await;

        assert!(matches!(result, Err(EtlError::Transform(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
