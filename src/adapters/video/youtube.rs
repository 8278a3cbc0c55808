//! YouTube Data API v3 implementation of the VideoSearch port.
//!
//! Issues a single `search.list` call for short, moderately safe-searched
//! videos and returns the first hit.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::ports::{VideoHit, VideoSearch, VideoSearchError};

/// Configuration for the YouTube search adapter.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    api_key: Option<Secret<String>>,
    /// Base URL of the Data API (default: https://www.googleapis.com/youtube/v3).
    pub base_url: String,
    /// Per-request timeout (default: 10s).
    pub timeout: Duration,
}

impl YouTubeConfig {
    /// Creates a configuration; without a key every search reports `NotConfigured`.
    pub fn new(api_key: Option<Secret<String>>) -> Self {
        Self {
            api_key,
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret().as_str())
            .filter(|key| !key.is_empty())
    }
}

/// YouTube search adapter.
pub struct YouTubeSearch {
    config: YouTubeConfig,
    client: Client,
}

impl YouTubeSearch {
    /// Creates the adapter on a shared HTTP client.
    pub fn new(config: YouTubeConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearch {
    async fn search(&self, query: &str) -> Result<Option<VideoHit>, VideoSearchError> {
        let api_key = self.config.api_key().ok_or(VideoSearchError::NotConfigured)?;

        let response = self
            .client
            .get(self.search_url())
            .timeout(self.config.timeout)
            .query(&[
                ("q", query.trim()),
                ("part", "id,snippet"),
                ("type", "video"),
                ("maxResults", "1"),
                ("safeSearch", "moderate"),
                ("videoDuration", "short"),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| VideoSearchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VideoSearchError::status(status.as_u16(), error_message(&body)));
        }

        let body: SearchListResponse = response
            .json()
            .await
            .map_err(|e| VideoSearchError::Parse(e.to_string()))?;

        Ok(body.first_hit())
    }
}

/// Pulls `error.message` out of a Google API error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

// ----- YouTube API Types -----

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

impl SearchListResponse {
    fn first_hit(self) -> Option<VideoHit> {
        let item = self.items.into_iter().next()?;
        let video_id = item.id.and_then(|id| id.video_id)?;
        let title = item.snippet.and_then(|s| s.title);
        Some(VideoHit::new(video_id, title))
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: Option<ResourceId>,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
}
