//! Recently played endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::error_message;
use crate::config::EtlConfig;
use crate::errors::ExtractionError;
use crate::models::PlayEvent;

/// Source of the user's most recent plays
#[async_trait]
pub trait RecentlyPlayedSource: Send + Sync {
    /// Fetch up to `limit` play events, newest first
    async fn recently_played(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<PlayEvent>, ExtractionError>;
}

/// `GET /me/player/recently-played` response
#[derive(Debug, Deserialize)]
struct RecentlyPlayedResponse {
    #[serde(default)]
    items: Vec<PlayHistoryItem>,
}

#[derive(Debug, Deserialize)]
struct PlayHistoryItem {
    track: TrackObject,
    played_at: String,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    name: String,
    #[serde(default)]
    artists: Vec<NamedObject>,
    album: NamedObject,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct NamedObject {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

impl From<PlayHistoryItem> for PlayEvent {
    fn from(item: PlayHistoryItem) -> Self {
        let track = item.track;
        // only the first listed artist is kept
        let artist = track
            .artists
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default();

        PlayEvent {
            track_name: track.name,
            artist_name: artist,
            album_name: track.album.name,
            track_url: track.external_urls.spotify.unwrap_or_default(),
            played_at: item.played_at,
        }
    }
}

/// Spotify Web API client for play history
pub struct SpotifyClient {
    client: Client,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(client: Client, config: &EtlConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RecentlyPlayedSource for SpotifyClient {
    async fn recently_played(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<PlayEvent>, ExtractionError> {
        let url = format!("{}/me/player/recently-played", self.api_url);

        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("limit", limit)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let page: RecentlyPlayedResponse = resp.json().await?;
        Ok(page.items.into_iter().map(PlayEvent::from).collect())
    }
}
