//! Land songs and albums in staging, then promote them to main

use sqlx::{Connection, SqliteConnection};
use tracing::{error, info};

use crate::db::{ensure_schemas, ensure_tables, AlbumTable, DbEngine, Schema, SongTable};
use crate::errors::LoadError;
use crate::models::{AlbumRecord, SongRecord};

/// Row counts after a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub staging_songs: i64,
    pub staging_albums: i64,
    pub main_songs: i64,
    pub main_albums: i64,
}

/// Upserts records into the staging and main schemas
pub struct Loader<'a> {
    db: &'a DbEngine,
}

impl<'a> Loader<'a> {
    pub fn new(db: &'a DbEngine) -> Self {
        Self { db }
    }

    /// Upsert into staging (one transaction) and merge staging into main
    /// (second transaction). Safe to repeat with the same input.
    pub async fn load(
        &self,
        songs: &[SongRecord],
        albums: &[AlbumRecord],
    ) -> Result<LoadReport, LoadError> {
        let result = self.run(songs, albums).await;
        if let Err(e) = &result {
            error!("Error loading data: {}", e);
        }
        result
    }

    async fn run(
        &self,
        songs: &[SongRecord],
        albums: &[AlbumRecord],
    ) -> Result<LoadReport, LoadError> {
        // one connection for the whole batch so the attach and both
        // transactions see the same session
        let mut pooled = self.db.pool().acquire().await?;
        let conn: &mut SqliteConnection = &mut pooled;

        ensure_schemas(conn, self.db.staging_path()).await?;
        ensure_tables(conn).await?;

        let mut tx = conn.begin().await?;
        for song in songs {
            SongTable::upsert(&mut tx, Schema::Staging, song).await?;
        }
        for album in albums {
            AlbumTable::upsert(&mut tx, Schema::Staging, album).await?;
        }
        tx.commit().await?;
        info!(
            "Data loaded to staging successfully ({} songs, {} albums)",
            songs.len(),
            albums.len()
        );

        let mut tx = conn.begin().await?;
        SongTable::promote(&mut tx).await?;
        AlbumTable::promote(&mut tx).await?;
        tx.commit().await?;

        let report = LoadReport {
            staging_songs: SongTable::count(conn, Schema::Staging).await?,
            staging_albums: AlbumTable::count(conn, Schema::Staging).await?,
            main_songs: SongTable::count(conn, Schema::Main).await?,
            main_albums: AlbumTable::count(conn, Schema::Main).await?,
        };
        info!(
            "Data loaded to main successfully ({} songs, {} albums)",
            report.main_songs, report.main_albums
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::transform::transform_on;
    use crate::models::PlayEvent;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn june_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn song(name: &str, hour: u32) -> SongRecord {
        SongRecord::new(
            name,
            "Artist X",
            "Album Y",
            Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        )
    }

    async fn rows(
        db: &DbEngine,
        schema: Schema,
    ) -> (Vec<SongRecord>, Vec<AlbumRecord>) {
        let mut conn = db.pool().acquire().await.unwrap();
        (
            SongTable::all(&mut conn, schema).await.unwrap(),
            AlbumTable::all(&mut conn, schema).await.unwrap(),
        )
    }

    #[tokio::test]
    async fn test_load_twice_is_idempotent() {
        let db = DbEngine::in_memory().await.unwrap();
        let loader = Loader::new(&db);

        let songs = vec![song("Song A", 10), song("Song B", 11)];
        let albums = vec![AlbumRecord::new("Album Y", "Artist X", june_first())];

        let first = loader.load(&songs, &albums).await.unwrap();
        let after_first = rows(&db, Schema::Main).await;

        let second = loader.load(&songs, &albums).await.unwrap();
        let after_second = rows(&db, Schema::Main).await;

        assert_eq!(first, second);
        assert_eq!(
            first,
            LoadReport {
                staging_songs: 2,
                staging_albums: 1,
                main_songs: 2,
                main_albums: 1,
            }
        );
        assert_eq!(after_first, after_second);
        assert_eq!(after_first.0, {
            let mut sorted = songs.clone();
            sorted.sort_by(|a, b| a.id.cmp(&b.id));
            sorted
        });
    }

    #[tokio::test]
    async fn test_reload_updates_non_key_fields() {
        let db = DbEngine::in_memory().await.unwrap();
        let loader = Loader::new(&db);

        loader.load(&[song("Song A", 10)], &[]).await.unwrap();
        loader.load(&[song("Song A", 15)], &[]).await.unwrap();

        for schema in [Schema::Staging, Schema::Main] {
            let (songs, _) = rows(&db, schema).await;
            assert_eq!(songs.len(), 1);
            assert_eq!(
                songs[0].played_at,
                Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_empty_load_creates_tables() {
        let db = DbEngine::in_memory().await.unwrap();
        let report = Loader::new(&db).load(&[], &[]).await.unwrap();
        assert_eq!(report, LoadReport::default());
    }

    #[tokio::test]
    async fn test_transform_then_load_end_to_end() {
        let events = vec![
            PlayEvent::new("Song A", "Artist X", "Album Y", "", "2024-06-01T10:00:00"),
            PlayEvent::new("Song B", "Artist X", "Album Y", "", "2024-06-01T10:04:00"),
            PlayEvent::new("Song C", "Artist Z", "Album W", "", "2024-06-01T10:09:00"),
        ];
        let out = transform_on(&events, june_first()).unwrap();

        let db = DbEngine::in_memory().await.unwrap();
        let report = Loader::new(&db)
            .load(&out.songs, &out.albums)
            .await
            .unwrap();

        assert_eq!(report.staging_songs, 3);
        assert_eq!(report.main_songs, 3);
        assert_eq!(report.staging_albums, 2);
        assert_eq!(report.main_albums, 2);

        let (_, albums) = rows(&db, Schema::Main).await;
        let ids: Vec<&str> = albums.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["Album W_Artist Z", "Album Y_Artist X"]);
    }
}
