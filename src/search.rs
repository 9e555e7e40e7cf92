use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::VideoCandidate;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const SEARCH_FIELDS: &str = "items(id/videoId,snippet/title,snippet/channelTitle)";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request timed out")]
    Timeout,

    #[error("search provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("unexpected search failure: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout
        } else {
            SearchError::Unexpected(err.to_string())
        }
    }
}

/// Ranked video lookup by free-text keywords
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<VideoCandidate>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: Option<String>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// YouTube Data API v3 `search.list` client
pub struct YouTubeSearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeSearch {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearch {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<VideoCandidate>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let max_results = limit.to_string();
        debug!("Searching YouTube: q={query:?} maxResults={limit}");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("fields", SEARCH_FIELDS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(SearchError::Provider {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        parse_search_response(&body)
    }
}

fn provider_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn parse_search_response(body: &str) -> Result<Vec<VideoCandidate>, SearchError> {
    let parsed: SearchListResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Unexpected(format!("invalid search response: {e}")))?;

    Ok(parsed
        .items
        .into_iter()
        .map(|item| {
            let snippet = item.snippet.unwrap_or(Snippet {
                title: None,
                channel_title: None,
            });
            VideoCandidate {
                video_id: item.id.and_then(|id| id.video_id),
                title: snippet.title.unwrap_or_default(),
                channel_title: snippet.channel_title.unwrap_or_default(),
            }
        })
        .collect())
}
