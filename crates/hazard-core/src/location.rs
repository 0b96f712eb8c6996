//! Resolving device trackers to positions and building the zone list.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::domain::{GeoPoint, Zone};

/// Current position of a device tracker, if known.
#[async_trait]
pub trait LocationSource: Send + Sync {
    async fn locate(&self, tracker_id: &str) -> Option<GeoPoint>;

    /// Called after the tracker swaps in a new configuration.
    async fn reconfigure(&self, _config: &TrackerConfig) {}
}

/// Positions held in memory, seeded from the configured static positions and
/// updatable at runtime.
#[derive(Debug, Default)]
pub struct StaticLocations {
    positions: RwLock<HashMap<String, GeoPoint>>,
}

impl StaticLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every tracker that has a static position in `config`.
    pub fn from_config(config: &TrackerConfig) -> Self {
        let positions = config
            .device_trackers
            .iter()
            .filter_map(|t| t.static_position().map(|p| (t.id.clone(), p)))
            .collect();
        StaticLocations {
            positions: RwLock::new(positions),
        }
    }

    pub async fn set(&self, tracker_id: &str, position: GeoPoint) {
        self.positions
            .write()
            .await
            .insert(tracker_id.to_string(), position);
    }

    pub async fn remove(&self, tracker_id: &str) {
        self.positions.write().await.remove(tracker_id);
    }
}

#[async_trait]
impl LocationSource for StaticLocations {
    async fn locate(&self, tracker_id: &str) -> Option<GeoPoint> {
        self.positions.read().await.get(tracker_id).copied()
    }

    /// Forget trackers no longer configured and apply the configured static
    /// positions. Runtime positions of the remaining trackers are kept.
    async fn reconfigure(&self, config: &TrackerConfig) {
        let mut positions = self.positions.write().await;
        positions.retain(|id, _| config.device_trackers.iter().any(|t| &t.id == id));
        for tracker in &config.device_trackers {
            if let Some(position) = tracker.static_position() {
                positions.insert(tracker.id.clone(), position);
            }
        }
    }
}

/// Zones for one cycle: the home zone, then each device tracker that can be
/// located right now.
pub async fn resolve_zones(config: &TrackerConfig, locations: &dyn LocationSource) -> Vec<Zone> {
    let mut zones = vec![Zone::home(
        &config.home.name,
        config.home.center(),
        config.home.radius_km,
    )];

    for tracker in &config.device_trackers {
        match locations.locate(&tracker.id).await {
            Some(position) if position.is_valid() => {
                zones.push(Zone::device_tracker(&tracker.id, position, tracker.radius_km));
            }
            Some(position) => {
                debug!(
                    tracker_id = %tracker.id,
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "device tracker position out of range, skipping zone"
                );
            }
            None => {
                debug!(tracker_id = %tracker.id, "device tracker has no position, skipping zone");
            }
        }
    }

    zones
}
