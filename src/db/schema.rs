//! Schema and table bootstrap
//!
//! SQLite has no `CREATE SCHEMA`: `main` is always the primary database and
//! `staging` is a second database file attached to the connection.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::errors::LoadError;

/// Landing area a table lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Staging,
    Main,
}

impl Schema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Schema::Staging => "staging",
            Schema::Main => "main",
        }
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Make sure both schemas are visible on this connection
pub async fn ensure_schemas(
    conn: &mut SqliteConnection,
    staging_path: &str,
) -> Result<(), LoadError> {
    let attached: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_database_list")
        .fetch_all(&mut *conn)
        .await?;

    if attached.iter().any(|name| name == Schema::Staging.as_str()) {
        return Ok(());
    }

    debug!("Attaching staging schema from {}", staging_path);
    sqlx::query("ATTACH DATABASE ? AS staging")
        .bind(staging_path)
        .execute(&mut *conn)
        .await
        .map_err(|source| LoadError::AttachStaging {
            path: staging_path.to_string(),
            source,
        })?;

    Ok(())
}

fn songs_ddl(schema: Schema) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {schema}.songs (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT NOT NULL,
            played_at TEXT NOT NULL
        )
        "#
    )
}

fn albums_ddl(schema: Schema) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {schema}.albums (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            artist TEXT NOT NULL,
            release_date TEXT NOT NULL
        )
        "#
    )
}

/// Create songs and albums tables in both schemas if they don't exist
pub async fn ensure_tables(conn: &mut SqliteConnection) -> Result<(), LoadError> {
    for schema in [Schema::Staging, Schema::Main] {
        sqlx::query(&songs_ddl(schema)).execute(&mut *conn).await?;
        sqlx::query(&albums_ddl(schema)).execute(&mut *conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbEngine;

    async fn table_names(conn: &mut SqliteConnection, schema: Schema) -> Vec<String> {
        sqlx::query_scalar(&format!(
            "SELECT name FROM {}.sqlite_master WHERE type = 'table' ORDER BY name",
            schema
        ))
        .fetch_all(conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let engine = DbEngine::in_memory().await.unwrap();
        let mut conn = engine.pool().acquire().await.unwrap();

        for _ in 0..2 {
            ensure_schemas(&mut conn, engine.staging_path()).await.unwrap();
            ensure_tables(&mut conn).await.unwrap();
        }

        assert_eq!(
            table_names(&mut conn, Schema::Staging).await,
            vec!["albums", "songs"]
        );
        assert_eq!(
            table_names(&mut conn, Schema::Main).await,
            vec!["albums", "songs"]
        );
    }

    #[test]
    fn test_ddl_is_schema_qualified() {
        assert!(songs_ddl(Schema::Staging).contains("staging.songs"));
        assert!(albums_ddl(Schema::Main).contains("main.albums"));
    }
}
