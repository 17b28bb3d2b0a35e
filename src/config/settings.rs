//! ETL settings
//!
//! Settings live in settings.json inside the config directory. Secrets are
//! normally supplied through the environment (or a .env file), which always
//! wins over the file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::Paths;

/// Largest page the recently played endpoint accepts
pub const MAX_RECENT_LIMIT: u32 = 50;

/// Job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtlConfig {
    /// Spotify application client id
    #[serde(default)]
    pub client_id: String,

    /// Spotify application client secret
    #[serde(default)]
    pub client_secret: String,

    /// Redirect URI registered for the application
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// OAuth scope the refresh token was granted
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Long-lived refresh token
    #[serde(default)]
    pub refresh_token: String,

    /// Accounts service base URL (token endpoint lives under it)
    #[serde(default = "default_accounts_url")]
    pub accounts_url: String,

    /// Web API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// How many recent plays to request
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Main database file; defaults to the config directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Staging database file; defaults to the config directory
    #[serde(default)]
    pub staging_database_path: Option<PathBuf>,

    /// Cron expression for `schedule`
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Automatic retries after a failed run
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Pause before a retry, in seconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            scope: default_scope(),
            refresh_token: String::new(),
            accounts_url: default_accounts_url(),
            api_url: default_api_url(),
            recent_limit: default_recent_limit(),
            http_timeout_secs: default_http_timeout(),
            database_path: None,
            staging_database_path: None,
            schedule: default_schedule(),
            retries: default_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl EtlConfig {
    /// Load settings.json (writing a default one if absent) and apply
    /// environment overrides
    pub fn load(paths: &Paths) -> Result<Self> {
        let mut config = Self::load_file(&paths.settings_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn load_file(settings_path: &Path) -> Result<Self> {
        if settings_path.exists() {
            let content =
                std::fs::read_to_string(settings_path).context("Failed to read settings file")?;
            serde_json::from_str(&content).context("Failed to parse settings file")
        } else {
            let config = Self::default();
            config.save(settings_path)?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self, settings_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(settings_path, content).context("Failed to write settings file")?;
        Ok(())
    }

    /// Override fields from environment variables
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("SPOTIFY_CLIENT_ID") {
            self.client_id = v;
        }
        if let Some(v) = non_empty("SPOTIFY_CLIENT_SECRET") {
            self.client_secret = v;
        }
        if let Some(v) = non_empty("SPOTIFY_REDIRECT_URI") {
            self.redirect_uri = v;
        }
        if let Some(v) = non_empty("SPOTIFY_SCOPE") {
            self.scope = v;
        }
        if let Some(v) = non_empty("SPOTIFY_REFRESH_TOKEN") {
            self.refresh_token = v;
        }
        if let Some(v) = non_empty("ETL_DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty("ETL_STAGING_DATABASE_PATH") {
            self.staging_database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = non_empty("ETL_RECENT_LIMIT") {
            self.recent_limit = v
                .trim()
                .parse()
                .with_context(|| format!("ETL_RECENT_LIMIT is not a number: {}", v))?;
        }

        Ok(())
    }

    /// Check that everything a run needs is present
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            bail!("Spotify client id is not configured (SPOTIFY_CLIENT_ID)");
        }
        if self.client_secret.is_empty() {
            bail!("Spotify client secret is not configured (SPOTIFY_CLIENT_SECRET)");
        }
        if self.refresh_token.is_empty() {
            bail!("Spotify refresh token is not configured (SPOTIFY_REFRESH_TOKEN)");
        }
        if self.recent_limit == 0 || self.recent_limit > MAX_RECENT_LIMIT {
            bail!(
                "recentLimit must be between 1 and {}, got {}",
                MAX_RECENT_LIMIT,
                self.recent_limit
            );
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Main database file, falling back to the config directory
    pub fn database_path(&self, paths: &Paths) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| paths.main_db_path())
    }

    /// Staging database file, falling back to the config directory
    pub fn staging_database_path(&self, paths: &Paths) -> PathBuf {
        self.staging_database_path
            .clone()
            .unwrap_or_else(|| paths.staging_db_path())
    }
}

// Default value functions for serde

fn default_redirect_uri() -> String {
    "http://localhost:8888/callback".to_string()
}

fn default_scope() -> String {
    "user-read-recently-played".to_string()
}

fn default_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_recent_limit() -> u32 {
    MAX_RECENT_LIMIT
}

fn default_http_timeout() -> u64 {
    30
}

fn default_schedule() -> String {
    // sec min hour day-of-month month day-of-week
    "0 0 0 * * *".to_string()
}

fn default_retries() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    300
}
