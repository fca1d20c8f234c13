//! Message fetching: the `MessageSource` seam and its HTTP implementation.
//!
//! DESIGN
//! ======
//! The feed loop only depends on [`MessageSource`], so tests drive it with
//! scripted snapshots and the binary plugs in [`HttpMessageSource`]. Every
//! failure collapses into [`FetchError`]; the loop surfaces it to the
//! consumer and stops polling until a manual trigger.

use std::time::Duration;

use crate::config::FeedConfig;
use crate::message::Message;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while fetching a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The server returned a non-success status.
    #[error("server responded with status {status}")]
    Status { status: u16, body: String },

    /// The response body was not a JSON array of messages.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// SOURCE TRAIT
// =============================================================================

/// Anything that can produce the current ordered message list of a room.
#[async_trait::async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch the full snapshot for `room_id`, ascending by `created_at`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the request fails, the server answers
    /// with a non-2xx status, or the payload is malformed.
    async fn fetch_messages(&self, room_id: &str) -> Result<Vec<Message>, FetchError>;
}

// =============================================================================
// HTTP SOURCE
// =============================================================================

/// `GET {base_url}/messages/{room_id}` over reqwest.
pub struct HttpMessageSource {
    http: reqwest::Client,
    base_url: String,
    session_token: Option<String>,
}

impl HttpMessageSource {
    /// Build a source from feed configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: &FeedConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| FetchError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), session_token: config.session_token.clone() })
    }

    #[must_use]
    pub fn messages_url(&self, room_id: &str) -> String {
        format!("{}/messages/{room_id}", self.base_url)
    }
}

#[async_trait::async_trait]
impl MessageSource for HttpMessageSource {
    async fn fetch_messages(&self, room_id: &str) -> Result<Vec<Message>, FetchError> {
        let mut request = self.http.get(self.messages_url(room_id));
        if let Some(token) = &self.session_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: text });
        }

        parse_snapshot(&text)
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_snapshot(json: &str) -> Result<Vec<Message>, FetchError> {
    serde_json::from_str(json).map_err(|e| FetchError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
