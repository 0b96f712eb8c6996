//! The seam between the tracker and the upstream feed.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{FeedPath, FetchError, Hazard};

/// Retrieves the current raw hazard list.
///
/// One call per cycle. Implementations bound the call in time, never retry
/// and never touch tracker state. Every path in `paths` is requested; if any
/// of them fails the whole fetch fails.
#[async_trait]
pub trait HazardFetcher: Send + Sync {
    async fn fetch(&self, paths: &BTreeSet<FeedPath>) -> Result<Vec<Hazard>, FetchError>;
}
