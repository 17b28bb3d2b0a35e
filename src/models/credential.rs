//! OAuth credential models

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Short-lived bearer token held for the lifetime of the process
#[derive(Debug, Clone)]
pub struct AccessCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessCredential {
    pub fn from_grant(grant: &TokenGrant, now: DateTime<Utc>) -> Self {
        Self {
            token: grant.access_token.clone(),
            expires_at: now + Duration::seconds(grant.expires_in),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Token endpoint response for `grant_type=refresh_token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Present only when the provider rotates the refresh token
    #[serde(default)]
    pub refresh_token: Option<String>,
}
