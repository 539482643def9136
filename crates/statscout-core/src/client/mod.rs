//! HTTP client for the StatsScout backend.

mod error;

use std::time::Duration;

use serde::Serialize;

pub use self::error::{ClientError, ClientErrorKind, ClientResult, classify_reqwest_error};
use crate::stream::{ChatEventStream, decode_events};
use crate::types::MatchList;

/// Standard User-Agent header for backend requests.
pub const USER_AGENT: &str = concat!("statscout/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    /// Path of the match-list endpoint.
    pub match_list_path: String,
    /// Connect timeout. The chat body itself is never timed out.
    pub connect_timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Backend API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Sends a chat message and returns the stream of response events.
    ///
    /// A non-OK status fails before any frame is read; the error carries the
    /// status code and the response body.
    pub async fn stream_chat(&self, message: &str) -> ClientResult<ChatEventStream> {
        let url = format!("{}/chat", self.config.base_url);
        tracing::debug!(%url, "Opening chat stream");

        let response = self
            .http
            .post(&url)
            .header("content-type", "application/json")
            .header("accept", "text/event-stream")
            .json(&ChatRequest { message })
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ClientError::http_status(status.as_u16(), &error_body));
        }

        Ok(decode_events(response.bytes_stream()))
    }

    /// Fetches the live/upcoming/recent match lists.
    pub async fn fetch_match_list(&self) -> ClientResult<MatchList> {
        let url = format!("{}{}", self.config.base_url, self.config.match_list_path);

        let response = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ClientError::http_status(status.as_u16(), &error_body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::parse(format!("Failed to parse match list: {e}")))
    }
}
