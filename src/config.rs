//! Feed configuration parsed from environment variables.

use std::time::Duration;

use crate::polling::{
    DEFAULT_ACTIVE_INTERVAL_MS, DEFAULT_EMPTY_INTERVAL_MS, DEFAULT_IDLE_INTERVAL_MS, DEFAULT_RECENT_INTERVAL_MS,
    PollPolicy,
};
use crate::reveal::{BATCH_SIZE, INITIAL_DISPLAY_COUNT, RevealLimits};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DISPLAY_DELAY_MS: u64 = 80;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be greater than zero")]
    Zero { var: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub base_url: String,
    pub session_token: Option<String>,
    pub timeouts: HttpTimeouts,
    pub reveal: RevealLimits,
    /// Delay between progressive reveal ticks.
    pub display_delay: Duration,
    pub poll: PollPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_token: None,
            timeouts: HttpTimeouts::default(),
            reveal: RevealLimits::default(),
            display_delay: Duration::from_millis(DEFAULT_DISPLAY_DELAY_MS),
            poll: PollPolicy::default(),
        }
    }
}

impl FeedConfig {
    /// Build typed feed config from environment variables.
    ///
    /// All optional:
    /// - `CHATFEED_BASE_URL`: API root, default `http://127.0.0.1:3000/api`
    /// - `CHATFEED_SESSION_TOKEN`: sent as a bearer token
    /// - `CHATFEED_REQUEST_TIMEOUT_SECS` / `CHATFEED_CONNECT_TIMEOUT_SECS`
    /// - `CHATFEED_INITIAL_DISPLAY_COUNT`, `CHATFEED_BATCH_SIZE`, `CHATFEED_DISPLAY_DELAY_MS`
    /// - `CHATFEED_POLL_EMPTY_MS`, `CHATFEED_POLL_ACTIVE_MS`, `CHATFEED_POLL_RECENT_MS`,
    ///   `CHATFEED_POLL_IDLE_MS`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Zero`] if a count or delay is configured as zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = std::env::var("CHATFEED_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let session_token = std::env::var("CHATFEED_SESSION_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        let timeouts = HttpTimeouts {
            request_secs: env_parse("CHATFEED_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("CHATFEED_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let reveal = RevealLimits {
            initial_display_count: nonzero(
                "CHATFEED_INITIAL_DISPLAY_COUNT",
                env_parse("CHATFEED_INITIAL_DISPLAY_COUNT", INITIAL_DISPLAY_COUNT),
            )?,
            batch_size: nonzero("CHATFEED_BATCH_SIZE", env_parse("CHATFEED_BATCH_SIZE", BATCH_SIZE))?,
        };
        let display_delay_ms = nonzero(
            "CHATFEED_DISPLAY_DELAY_MS",
            env_parse("CHATFEED_DISPLAY_DELAY_MS", DEFAULT_DISPLAY_DELAY_MS),
        )?;
        let poll = PollPolicy {
            empty: env_millis("CHATFEED_POLL_EMPTY_MS", DEFAULT_EMPTY_INTERVAL_MS)?,
            active: env_millis("CHATFEED_POLL_ACTIVE_MS", DEFAULT_ACTIVE_INTERVAL_MS)?,
            recent: env_millis("CHATFEED_POLL_RECENT_MS", DEFAULT_RECENT_INTERVAL_MS)?,
            idle: env_millis("CHATFEED_POLL_IDLE_MS", DEFAULT_IDLE_INTERVAL_MS)?,
        };

        Ok(Self::default()
            .with_base_url(&base_url)
            .with_session_token(session_token)
            .with_timeouts(timeouts)
            .with_reveal(reveal, Duration::from_millis(display_delay_ms))
            .with_poll(poll))
    }

    /// Set the API root. A trailing `/` is trimmed.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_session_token(mut self, token: Option<String>) -> Self {
        self.session_token = token;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, timeouts: HttpTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub fn with_reveal(mut self, reveal: RevealLimits, display_delay: Duration) -> Self {
        self.reveal = reveal;
        self.display_delay = display_delay;
        self
    }

    #[must_use]
    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_millis(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    nonzero(key, env_parse(key, default)).map(Duration::from_millis)
}

fn nonzero<T>(var: &'static str, value: T) -> Result<T, ConfigError>
where
    T: Default + PartialEq,
{
    if value == T::default() { Err(ConfigError::Zero { var }) } else { Ok(value) }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
