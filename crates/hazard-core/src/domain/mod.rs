//! Domain models for the hazard tracker.
//!
//! - `Hazard`: one upstream record
//! - `Zone` / `ZoneMatch`: proximity regions and the hazards inside them
//! - `NearbyHazard` / `NearbySet`: the deduplicated per-cycle view
//! - `category`: display names and feed path routing

pub mod category;
pub mod error;
pub mod hazard;
pub mod nearby;
pub mod zone;

pub use category::{
    display_name, feed_path_for, feed_paths_for, summary_name, FeedPath, ATTRIBUTION,
    DEFAULT_MONITORED_CATEGORIES,
};
pub use error::{ConfigError, DeliveryError, FetchError, Result, StoreError, TrackerError};
pub use hazard::{Hazard, HazardId};
pub use nearby::{NearbyHazard, NearbySet};
pub use zone::{GeoPoint, Zone, ZoneKind, ZoneMatch};
