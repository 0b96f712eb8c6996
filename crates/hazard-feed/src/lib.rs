//! Hazard Feed
//!
//! Client for the live hazards GeoJSON feed. [`FeedClient`] implements
//! `hazard_core::HazardFetcher`: it requests every selected feed path
//! concurrently, maps each GeoJSON feature onto a `Hazard` and merges the
//! results by id.

pub mod client;
pub mod config;
pub mod error;
pub mod geojson;

pub use client::FeedClient;
pub use config::{FeedConfig, API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use error::FeedError;
pub use geojson::parse_feature_collection;

/// Result type for feed client setup
pub type Result<T> = std::result::Result<T, FeedError>;
