//! Feed client configuration.

use serde::{Deserialize, Serialize};

use crate::error::FeedError;

pub const DEFAULT_BASE_URL: &str = "https://api.transport.nsw.gov.au/v1/live/hazards";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "HAZARD_FEED_API_KEY";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Where the feed lives and how to authenticate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bound on each request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: default_base_url(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            api_key: String::new(),
        }
    }
}

impl FeedConfig {
    pub fn new(api_key: &str) -> Self {
        FeedConfig {
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    /// Point at another server, e.g. a mock in tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        if self.api_key.trim().is_empty() {
            return Err(FeedError::InvalidConfig(format!(
                "API key is required (set api_key or {API_KEY_ENV})"
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(FeedError::InvalidConfig("timeout_seconds must be > 0".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FeedError::InvalidConfig(format!(
                "base_url must be an http(s) URL, got {}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// `{base}/{path}/open?format=geojson`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/open?format=geojson", self.base_url.trim_end_matches('/'), path)
    }
}
