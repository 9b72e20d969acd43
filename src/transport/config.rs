//! Transport configuration.

use crate::error::TransportError;
use crate::transport::HTTP_USER_AGENT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration shared by the concrete transporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// User agent sent when the caller supplies none.
    pub user_agent: String,
    /// Request timeout in seconds, `0` to disable.
    ///
    /// In-memory bodies are bounded end to end. For bodies streamed from a
    /// [`Resource`](crate::transport::Resource) the clock starts once the
    /// last chunk has been sent, so a large upload is not cut short; a
    /// reader that stalls mid-body is not timed out.
    pub request_timeout: u64,
    /// Connect timeout in seconds, `0` to disable.
    pub connect_timeout: u64,
    /// Maximum response body size in bytes.
    pub max_response_size: usize,
    /// Read size used when streaming a resource body.
    pub chunk_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: HTTP_USER_AGENT.to_string(),
            request_timeout: 30,
            connect_timeout: 10,
            max_response_size: 10 * 1024 * 1024, // 10MB
            chunk_size: 64 * 1024,
        }
    }
}

impl TransportConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `TETHER_*` environment variables.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TransportError> {
        let mut config = Self::default();
        if let Some(agent) = lookup("TETHER_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(secs) = parse_var(&lookup, "TETHER_REQUEST_TIMEOUT")? {
            config.request_timeout = secs;
        }
        if let Some(secs) = parse_var(&lookup, "TETHER_CONNECT_TIMEOUT")? {
            config.connect_timeout = secs;
        }
        if let Some(size) = parse_var(&lookup, "TETHER_MAX_RESPONSE_SIZE")? {
            config.max_response_size = size;
        }
        if let Some(size) = parse_var(&lookup, "TETHER_CHUNK_SIZE")? {
            config.chunk_size = size;
        }
        Ok(config)
    }

    /// Set the default user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout in seconds.
    pub fn request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = secs;
        self
    }

    /// Set the connect timeout in seconds.
    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout = secs;
        self
    }

    /// Set the maximum response body size.
    pub fn max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = bytes;
        self
    }

    /// Set the streaming read size.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    pub(crate) fn request_timeout_duration(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_secs(self.request_timeout))
    }

    pub(crate) fn connect_timeout_duration(&self) -> Option<Duration> {
        (self.connect_timeout > 0).then(|| Duration::from_secs(self.connect_timeout))
    }

    pub(crate) fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, TransportError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TransportError::Config(format!("{} must be a number, got '{}'", key, raw))),
    }
}
