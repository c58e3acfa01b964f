use std::time::Duration;

use reqwest::Url;

use crate::errors::StreamError;
use crate::options::StreamOptions;

/// Endpoint path of the notepad stream on the backend.
pub const NOTEPAD_ENDPOINT: &str = "/api/streaming/notepad";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Configuration for the stream client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Scheme, host and port of the backend.
    pub base_url: String,
    /// Path of the SSE endpoint below `base_url`.
    pub endpoint: String,
    /// Delay before reconnecting after a transient error.
    ///
    /// A `retry:` field sent by the server overrides this per subscription.
    pub retry: Duration,
    /// Upper bound for establishing a connection.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    /// Creates a config pointing at `base_url` with browser-like defaults.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: NOTEPAD_ENDPOINT.to_string(),
            retry: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Builds a config from `NOTEPAD_BASE_URL`, falling back to the local backend.
    pub fn from_env() -> Self {
        match std::env::var("NOTEPAD_BASE_URL") {
            Ok(value) if !value.trim().is_empty() => Self::new(value.trim()),
            _ => Self::default(),
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StreamError> {
        if self.base_url.trim().is_empty() {
            return Err(StreamError::Config("base_url must not be empty".into()));
        }
        if !self.endpoint.starts_with('/') {
            return Err(StreamError::Config(format!(
                "endpoint must start with '/': {}",
                self.endpoint
            )));
        }
        Ok(())
    }

    /// Full request URL for a subscription with `options`.
    pub fn stream_url(&self, options: &StreamOptions) -> Result<Url, StreamError> {
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), self.endpoint);
        let mut url =
            Url::parse(&raw).map_err(|e| StreamError::InvalidUrl(format!("{raw}: {e}")))?;
        options.apply_to(&mut url);
        Ok(url)
    }
}
