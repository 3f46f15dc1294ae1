//! Freesound API client
//!
//! Keyword search for short ambient loops. Only the first hit is used, and
//! only its low-quality MP3 preview, which streams quickly in the browser.

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use trinoro_common::api::SoundPreview;

pub const FREESOUND_BASE_URL: &str = "https://freesound.org/apiv2";
const USER_AGENT: &str = concat!("Trinoro/", env!("CARGO_PKG_VERSION"));
const PREVIEW_KEY: &str = "preview-lq-mp3";
/// Loops between 5 seconds and 3 minutes
const DURATION_FILTER: &str = "duration:[5 TO 180]";

#[derive(Debug, Error)]
pub enum FreesoundError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid API token")]
    InvalidToken,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: u64,
    name: String,
    #[serde(default)]
    previews: HashMap<String, String>,
}

pub struct FreesoundClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl FreesoundClient {
    pub fn new(token: String, base_url: Option<String>) -> Result<Self, FreesoundError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FreesoundError::NetworkError(e.to_string()))?;

        let base_url = base_url
            .unwrap_or_else(|| FREESOUND_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http_client,
            base_url,
            token,
        })
    }

    /// First matching preview for `query`, or `None` when nothing matches.
    pub async fn search(&self, query: &str) -> Result<Option<SoundPreview>, FreesoundError> {
        let url = format!("{}/search/text/", self.base_url);

        tracing::debug!(query = query, "Querying Freesound");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("filter", DURATION_FILTER),
                ("fields", "id,name,previews"),
                ("token", self.token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FreesoundError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == 401 {
            return Err(FreesoundError::InvalidToken);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FreesoundError::ApiError(status.as_u16(), error_text));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| FreesoundError::ParseError(e.to_string()))?;

        let Some(first) = search.results.into_iter().next() else {
            tracing::info!(query = query, "Freesound returned no results");
            return Ok(None);
        };

        let preview = first.previews.get(PREVIEW_KEY).cloned().ok_or_else(|| {
            FreesoundError::ParseError(format!("Result {} has no {}", first.id, PREVIEW_KEY))
        })?;

        tracing::info!(query = query, sound_id = first.id, name = %first.name, "Freesound match");

        Ok(Some(SoundPreview {
            id: first.id,
            name: first.name,
            preview,
        }))
    }
}
