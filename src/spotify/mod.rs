//! Spotify Web API access
//!
//! `auth` owns the refresh-token flow, `client` reads the play history.

pub mod auth;
pub mod client;

pub use auth::{LogTokenStore, SpotifyOAuth, TokenExchange, TokenManager, TokenStore};
pub use client::{RecentlyPlayedSource, SpotifyClient};

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;

use crate::config::EtlConfig;

/// Build the HTTP client shared by the token and API calls
pub fn http_client(config: &EtlConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(config.http_timeout())
        .user_agent(concat!("spotify-etl/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Error body shapes used by the accounts service and the Web API
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    /// `{"error":{"status":401,"message":"..."}}`
    Api { error: ApiErrorObject },
    /// `{"error":"invalid_grant","error_description":"..."}`
    OAuth {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct ApiErrorObject {
    #[serde(default)]
    message: String,
}

/// Best-effort human readable message out of an error response body
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Api { error }) => error.message,
        Ok(ErrorBody::OAuth {
            error,
            error_description,
        }) => match error_description {
            Some(description) => format!("{}: {}", error, description),
            None => error,
        },
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":{"status":401,"message":"The access token expired"}}"#),
            "The access token expired"
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid refresh token"}"#),
            "invalid_grant: Invalid refresh token"
        );
        assert_eq!(error_message("Bad gateway\n"), "Bad gateway");
    }
}
