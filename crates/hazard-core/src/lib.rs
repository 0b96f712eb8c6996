//! Hazard Core Library
//!
//! Proximity filtering, lifecycle diffing and aggregation for live traffic
//! hazards. Each cycle runs fetch → filter → diff against the stored
//! baseline → commit → summarize and dispatch.

pub mod aggregate;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod domain;
pub mod fetch;
pub mod geo;
pub mod location;
pub mod metrics;
pub mod obs;
pub mod proximity;
pub mod scheduler;
pub mod store;
pub mod telemetry;
pub mod tracker;

pub use aggregate::{summarize, summarize_monitored, CategorySummary, NearbyHazardItem, SummaryPayload};

pub use config::{DeviceTrackerConfig, HomeZoneConfig, TrackerConfig, MIN_UPDATE_INTERVAL_SECS};

pub use diff::{diff_nearby, significant_changes, Changes, DiffResult, FieldChange, SIGNIFICANT_FIELDS};

pub use dispatch::{attributes, to_events, HazardConsumer, OutboundEvent};

pub use domain::{
    ConfigError, DeliveryError, FeedPath, FetchError, GeoPoint, Hazard, HazardId, NearbyHazard,
    NearbySet, Result, StoreError, TrackerError, Zone, ZoneKind, ZoneMatch,
};

pub use fetch::HazardFetcher;

pub use location::{resolve_zones, LocationSource, StaticLocations};

pub use metrics::CycleMetrics;

pub use proximity::{filter_nearby, match_zones};

pub use scheduler::{Scheduler, SchedulerHandle};

pub use store::{FileStateStore, HazardStateStore, MemoryStateStore};

pub use tracker::{CycleReport, HazardTracker};
