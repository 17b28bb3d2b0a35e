//! Path management for the ETL job
//!
//! Resolves the config directory and every file derived from it.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Filesystem locations used by the job
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory path
    config_dir: PathBuf,
}

impl Paths {
    /// Resolve the config directory and make sure it exists
    pub fn init(config_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_override {
            Some(path) => path,
            None => directories::ProjectDirs::from("", "", "spotify-etl")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".spotify-etl")),
        };

        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory {}", config_dir.display())
        })?;

        Ok(Self { config_dir })
    }

    /// Get the config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Default path of the main database
    pub fn main_db_path(&self) -> PathBuf {
        self.config_dir.join("spotify_etl.db")
    }

    /// Default path of the database attached as the staging schema
    pub fn staging_db_path(&self) -> PathBuf {
        self.config_dir.join("staging.db")
    }
}
