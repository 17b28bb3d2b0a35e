//! Album table operations

use sqlx::SqliteConnection;

use crate::db::Schema;
use crate::models::AlbumRecord;

/// Album table operations
pub struct AlbumTable;

impl AlbumTable {
    /// Insert an album or overwrite every non-key field of the existing row
    pub async fn upsert(
        conn: &mut SqliteConnection,
        schema: Schema,
        album: &AlbumRecord,
    ) -> Result<(), sqlx::Error> {
        let sql = format!(
            "INSERT INTO {}.albums (id, name, artist, release_date) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, artist = excluded.artist,
                release_date = excluded.release_date",
            schema
        );

        sqlx::query(&sql)
            .bind(&album.id)
            .bind(&album.name)
            .bind(&album.artist)
            .bind(album.release_date)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Merge every staging row into main
    pub async fn promote(conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO main.albums (id, name, artist, release_date)
             SELECT id, name, artist, release_date FROM staging.albums WHERE true
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name, artist = excluded.artist,
                release_date = excluded.release_date",
        )
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count(conn: &mut SqliteConnection, schema: Schema) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}.albums", schema))
            .fetch_one(conn)
            .await?;
        Ok(row.0)
    }

    /// All albums ordered by id
    pub async fn all(
        conn: &mut SqliteConnection,
        schema: Schema,
    ) -> Result<Vec<AlbumRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT id, name, artist, release_date FROM {}.albums ORDER BY id",
            schema
        ))
        .fetch_all(conn)
        .await
    }
}
