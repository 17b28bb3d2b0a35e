//! Access token lifecycle
//!
//! Each run starts with only the long-lived refresh token. The first call to
//! [`TokenManager::get_access_token`] exchanges it for an access token, which
//! is reused until it expires.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::error_message;
use crate::config::EtlConfig;
use crate::errors::AuthError;
use crate::models::{AccessCredential, TokenGrant};

/// Exchanges a refresh token for a fresh access token
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError>;
}

/// Hook invoked after every successful refresh
pub trait TokenStore: Send + Sync {
    fn store(&self, credential: &AccessCredential);
}

/// Token store that only logs; refreshed tokens are never persisted
#[derive(Debug, Default)]
pub struct LogTokenStore;

impl TokenStore for LogTokenStore {
    fn store(&self, credential: &AccessCredential) {
        info!(
            "Access token stored: {} (expires {})",
            mask(&credential.token),
            credential.expires_at.to_rfc3339()
        );
    }
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}****", visible)
}

/// Refresh-token grant against the Spotify accounts service
pub struct SpotifyOAuth {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl SpotifyOAuth {
    pub fn new(client: Client, config: &EtlConfig) -> Self {
        Self {
            client,
            token_url: format!("{}/api/token", config.accounts_url.trim_end_matches('/')),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }
}

#[async_trait]
impl TokenExchange for SpotifyOAuth {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let resp = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(resp.json::<TokenGrant>().await?)
    }
}

struct TokenState {
    refresh_token: String,
    access: Option<AccessCredential>,
}

/// Holds the refresh token and the current access token for one run
pub struct TokenManager {
    exchange: Box<dyn TokenExchange>,
    store: Box<dyn TokenStore>,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(exchange: Box<dyn TokenExchange>, refresh_token: impl Into<String>) -> Self {
        Self {
            exchange,
            store: Box::new(LogTokenStore),
            state: Mutex::new(TokenState {
                refresh_token: refresh_token.into(),
                access: None,
            }),
        }
    }

    /// Manager backed by the real accounts service
    pub fn from_config(client: Client, config: &EtlConfig) -> Self {
        debug!(
            "Token manager for client {} (scope `{}`, redirect {})",
            config.client_id, config.scope, config.redirect_uri
        );
        Self::new(
            Box::new(SpotifyOAuth::new(client, config)),
            config.refresh_token.clone(),
        )
    }

    pub fn with_store(mut self, store: Box<dyn TokenStore>) -> Self {
        self.store = store;
        self
    }

    /// Get a valid access token, refreshing it if absent or expired
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        self.get_access_token_at(Utc::now()).await
    }

    pub async fn get_access_token_at(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
        let mut state = self.state.lock().await;

        if let Some(access) = state.access.as_ref() {
            if !access.is_expired(now) {
                return Ok(access.token.clone());
            }
            info!("Access token expired, refreshing...");
        } else {
            debug!("No access token held, refreshing...");
        }

        let credential = self.refresh(&mut state, now).await?;
        Ok(credential.token)
    }

    async fn refresh(
        &self,
        state: &mut TokenState,
        now: DateTime<Utc>,
    ) -> Result<AccessCredential, AuthError> {
        if state.refresh_token.is_empty() {
            error!("Cannot refresh access token: no refresh token configured");
            return Err(AuthError::MissingCredential("refresh token"));
        }

        let grant = match self.exchange.refresh(&state.refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                error!("Error refreshing access token: {}", e);
                return Err(e);
            }
        };

        if let Some(rotated) = grant.refresh_token.as_ref().filter(|t| !t.is_empty()) {
            debug!("Provider rotated the refresh token");
            state.refresh_token = rotated.clone();
        }

        let credential = AccessCredential::from_grant(&grant, now);
        self.store.store(&credential);
        state.access = Some(credential.clone());

        Ok(credential)
    }
}
