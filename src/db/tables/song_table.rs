//! Song table operations

use sqlx::SqliteConnection;

use crate::db::Schema;
use crate::models::SongRecord;

/// Song table operations
pub struct SongTable;

impl SongTable {
    /// Insert a song or overwrite every non-key field of the existing row
    pub async fn upsert(
        conn: &mut SqliteConnection,
        schema: Schema,
        song: &SongRecord,
    ) -> Result<(), sqlx::Error> {
        let sql = format!(
            "INSERT INTO {}.songs (id, name, artist, album, played_at) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, artist = excluded.artist,
                album = excluded.album, played_at = excluded.played_at",
            schema
        );

        sqlx::query(&sql)
            .bind(&song.id)
            .bind(&song.name)
            .bind(&song.artist)
            .bind(&song.album)
            .bind(song.played_at)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Merge every staging row into main
    pub async fn promote(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        // `WHERE true` keeps the upsert clause from parsing as a join constraint
        let result = sqlx::query(
            "INSERT INTO main.songs (id, name, artist, album, played_at)
             SELECT id, name, artist, album, played_at FROM staging.songs WHERE true
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, artist = excluded.artist,
                album = excluded.album, played_at = excluded.played_at",
        )
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count(conn: &mut SqliteConnection, schema: Schema) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}.songs", schema))
            .fetch_one(conn)
            .await?;
        Ok(row.0)
    }

    /// All songs ordered by id
    pub async fn all(
        conn: &mut SqliteConnection,
        schema: Schema,
    ) -> Result<Vec<SongRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT id, name, artist, album, played_at FROM {}.songs ORDER BY id",
            schema
        ))
        .fetch_all(conn)
        .await
    }
}
