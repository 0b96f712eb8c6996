//! Feed HTTP client.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use hazard_core::{FeedPath, FetchError, Hazard, HazardFetcher};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info};

use crate::config::FeedConfig;
use crate::error::{classify, from_status};
use crate::geojson::parse_feature_collection;
use crate::Result;

/// Client for the hazards feed.
pub struct FeedClient {
    config: FeedConfig,
    http_client: reqwest::Client,
}

impl FeedClient {
    /// Validate `config` and build the client.
    pub fn new(config: FeedConfig) -> Result<Self> {
        config.validate()?;
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("hazard-feed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(FeedClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    /// Fetch and parse one feed path, bounded by the configured timeout.
    pub async fn fetch_path(&self, path: FeedPath) -> std::result::Result<Vec<Hazard>, FetchError> {
        let seconds = self.config.timeout_seconds;
        match tokio::time::timeout(self.timeout(), self.request(path)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout { seconds }),
        }
    }

    async fn request(&self, path: FeedPath) -> std::result::Result<Vec<Hazard>, FetchError> {
        let url = self.config.endpoint(path.as_str());
        let seconds = self.config.timeout_seconds;
        debug!(%path, %url, "requesting feed path");

        let response = self
            .http_client
            .get(&url)
            .header(AUTHORIZATION, format!("apikey {}", self.config.api_key))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| classify(e, seconds))?;

        let status = response.status();
        if !status.is_success() {
            return Err(from_status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") && !content_type.contains("application/geo+json") {
            return Err(FetchError::Parse(format!(
                "unexpected content type {content_type:?} from {path} feed"
            )));
        }

        let body = response.bytes().await.map_err(|e| classify(e, seconds))?;
        let hazards = parse_feature_collection(&body)?;
        debug!(%path, count = hazards.len(), "feed path parsed");
        Ok(hazards)
    }
}

#[async_trait]
impl HazardFetcher for FeedClient {
    /// Request every path concurrently; the first failure fails the fetch.
    /// Hazards are merged in path order, the first occurrence of an id wins.
    async fn fetch(&self, paths: &BTreeSet<FeedPath>) -> std::result::Result<Vec<Hazard>, FetchError> {
        let per_path = try_join_all(paths.iter().map(|p| self.fetch_path(*p))).await?;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for hazard in per_path.into_iter().flatten() {
            if seen.insert(hazard.id.clone()) {
                merged.push(hazard);
            } else {
                debug!(hazard_id = %hazard.id, "hazard published on more than one path");
            }
        }

        info!(paths = paths.len(), hazards = merged.len(), "fetched hazards feed");
        Ok(merged)
    }
}
