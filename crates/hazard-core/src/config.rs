//! Tracker configuration.
//!
//! Every recognised option lives on [`TrackerConfig`]. Values are checked once
//! by [`TrackerConfig::validate`]; the cycle never re-validates.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{
    feed_paths_for, ConfigError, FeedPath, GeoPoint, DEFAULT_MONITORED_CATEGORIES,
};

/// Shortest accepted refresh interval.
pub const MIN_UPDATE_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HOME_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_DEVICE_RADIUS_KM: f64 = 5.0;

fn default_instance_id() -> String {
    "default".to_string()
}

fn default_update_interval() -> u64 {
    DEFAULT_UPDATE_INTERVAL_SECS
}

fn default_monitored_categories() -> BTreeSet<String> {
    DEFAULT_MONITORED_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_home_name() -> String {
    "home".to_string()
}

fn default_home_radius() -> f64 {
    DEFAULT_HOME_RADIUS_KM
}

fn default_device_radius() -> f64 {
    DEFAULT_DEVICE_RADIUS_KM
}

/// The home zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeZoneConfig {
    #[serde(default = "default_home_name")]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_home_radius")]
    pub radius_km: f64,
}

impl HomeZoneConfig {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A device tracker whose current position defines a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTrackerConfig {
    /// Tracker identifier, e.g. `device_tracker.phone`.
    pub id: String,
    #[serde(default = "default_device_radius")]
    pub radius_km: f64,
    /// Optional fixed position, used by `StaticLocations`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl DeviceTrackerConfig {
    pub fn new(id: &str, radius_km: f64) -> Self {
        DeviceTrackerConfig {
            id: id.to_string(),
            radius_km,
            latitude: None,
            longitude: None,
        }
    }

    pub fn static_position(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

/// Configuration of one tracker instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Identifies this instance in events and logs.
    #[serde(default = "default_instance_id")]
    pub instance_id: String,

    #[serde(default = "default_update_interval")]
    pub update_interval_seconds: u64,

    /// Categories to track, matched case-insensitively against `main_category`.
    #[serde(default = "default_monitored_categories")]
    pub monitored_categories: BTreeSet<String>,

    pub home: HomeZoneConfig,

    #[serde(default)]
    pub device_trackers: Vec<DeviceTrackerConfig>,
}

impl TrackerConfig {
    /// Configuration with defaults for everything except the home position.
    pub fn new(home_latitude: f64, home_longitude: f64) -> Self {
        TrackerConfig {
            instance_id: default_instance_id(),
            update_interval_seconds: DEFAULT_UPDATE_INTERVAL_SECS,
            monitored_categories: default_monitored_categories(),
            home: HomeZoneConfig {
                name: default_home_name(),
                latitude: home_latitude,
                longitude: home_longitude,
                radius_km: DEFAULT_HOME_RADIUS_KM,
            },
            device_trackers: Vec::new(),
        }
    }

    /// Parse TOML and validate.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn with_monitored_categories(mut self, categories: &[&str]) -> Self {
        self.monitored_categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_home_radius(mut self, radius_km: f64) -> Self {
        self.home.radius_km = radius_km;
        self
    }

    pub fn with_device_tracker(mut self, tracker: DeviceTrackerConfig) -> Self {
        self.device_trackers.push(tracker);
        self
    }

    pub fn with_update_interval(mut self, seconds: u64) -> Self {
        self.update_interval_seconds = seconds;
        self
    }

    /// Reject anything outside its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_id.trim().is_empty() {
            return Err(ConfigError::Invalid("instance_id must not be blank".into()));
        }

        if self.update_interval_seconds < MIN_UPDATE_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooShort {
                seconds: self.update_interval_seconds,
                min: MIN_UPDATE_INTERVAL_SECS,
            });
        }

        if self.normalized_categories().is_empty() {
            return Err(ConfigError::EmptyMonitoredCategories);
        }

        check_radius(&self.home.name, self.home.radius_km)?;
        check_position(&self.home.name, self.home.center())?;

        let mut seen = HashSet::new();
        for tracker in &self.device_trackers {
            if tracker.id.trim().is_empty() {
                return Err(ConfigError::Invalid("device tracker id must not be blank".into()));
            }
            if !seen.insert(tracker.id.as_str()) {
                return Err(ConfigError::DuplicateTracker(tracker.id.clone()));
            }
            check_radius(&tracker.id, tracker.radius_km)?;
            match (tracker.latitude, tracker.longitude) {
                (Some(lat), Some(lon)) => check_position(&tracker.id, GeoPoint::new(lat, lon))?,
                (None, None) => {}
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "device tracker {} needs both latitude and longitude",
                        tracker.id
                    )))
                }
            }
        }

        Ok(())
    }

    /// Monitored categories, trimmed and lower-cased, blanks removed.
    pub fn normalized_categories(&self) -> BTreeSet<String> {
        self.monitored_categories
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Feed paths that publish the monitored categories.
    pub fn feed_paths(&self) -> BTreeSet<FeedPath> {
        feed_paths_for(&self.normalized_categories())
    }

    pub fn update_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.update_interval_seconds)
    }

    /// Whether switching to `other` invalidates the stored baseline: zones,
    /// radii or the monitored set differ.
    pub fn zones_changed(&self, other: &TrackerConfig) -> bool {
        let trackers = |c: &TrackerConfig| -> Vec<(String, u64)> {
            let mut v: Vec<(String, u64)> = c
                .device_trackers
                .iter()
                .map(|t| (t.id.clone(), t.radius_km.to_bits()))
                .collect();
            v.sort();
            v
        };

        self.home != other.home
            || trackers(self) != trackers(other)
            || self.normalized_categories() != other.normalized_categories()
    }
}

fn check_radius(zone: &str, radius_km: f64) -> Result<(), ConfigError> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRadius {
            zone: zone.to_string(),
            radius_km,
        })
    }
}

fn check_position(zone: &str, point: GeoPoint) -> Result<(), ConfigError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(ConfigError::InvalidCoordinates {
            zone: zone.to_string(),
            latitude: point.latitude,
            longitude: point.longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TrackerConfig {
        TrackerConfig::new(-33.8688, 151.2093)
    }

    #[test]
    fn defaults_are_valid() {
        let config = base();
        config.validate().unwrap();
        assert_eq!(config.update_interval_seconds, 300);
        assert_eq!(config.home.radius_km, 10.0);
        assert!(config.monitored_categories.contains("accident"));
    }

    #[test]
    fn interval_below_minimum_rejected() {
        let err = base().with_update_interval(59).validate().unwrap_err();
        assert!(matches!(err, ConfigError::IntervalTooShort { seconds: 59, min: 60 }));
        base().with_update_interval(60).validate().unwrap();
    }

    #[test]
    fn non_positive_radius_rejected() {
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = base().with_home_radius(radius).validate().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRadius { .. }));
        }

        let err = base()
            .with_device_tracker(DeviceTrackerConfig::new("device_tracker.phone", 0.0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRadius { zone, .. } if zone == "device_tracker.phone"));
    }

    #[test]
    fn empty_monitored_set_rejected() {
        let err = base().with_monitored_categories(&[]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMonitoredCategories));

        let err = base().with_monitored_categories(&["  "]).validate().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMonitoredCategories));
    }

    #[test]
    fn duplicate_tracker_rejected() {
        let err = base()
            .with_device_tracker(DeviceTrackerConfig::new("device_tracker.phone", 5.0))
            .with_device_tracker(DeviceTrackerConfig::new("device_tracker.phone", 3.0))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateTracker(id) if id == "device_tracker.phone"));
    }

    #[test]
    fn bad_home_coordinates_rejected() {
        let err = TrackerConfig::new(-95.0, 151.0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidCoordinates { .. }));
    }

    #[test]
    fn half_a_static_position_rejected() {
        let mut tracker = DeviceTrackerConfig::new("device_tracker.car", 5.0);
        tracker.latitude = Some(-33.9);
        let err = base().with_device_tracker(tracker).validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config = TrackerConfig::from_toml_str(
            r#"
            monitored_categories = ["Accident", "fire"]

            [home]
            latitude = -33.8688
            longitude = 151.2093

            [[device_trackers]]
            id = "device_tracker.phone"
            "#,
        )
        .unwrap();

        assert_eq!(config.instance_id, "default");
        assert_eq!(config.home.name, "home");
        assert_eq!(config.device_trackers[0].radius_km, DEFAULT_DEVICE_RADIUS_KM);
        let expected: BTreeSet<String> = ["accident", "fire"].iter().map(|s| s.to_string()).collect();
        assert_eq!(config.normalized_categories(), expected);
        assert_eq!(
            config.feed_paths().into_iter().collect::<Vec<_>>(),
            vec![FeedPath::Incident, FeedPath::Fire]
        );
    }

    #[test]
    fn toml_with_short_interval_fails_validation() {
        let err = TrackerConfig::from_toml_str(
            r#"
            update_interval_seconds = 10
            [home]
            latitude = -33.0
            longitude = 151.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::IntervalTooShort { .. }));
    }

    #[test]
    fn zones_changed_detection() {
        let a = base();
        assert!(!a.zones_changed(&a.clone().with_update_interval(600)));
        assert!(a.zones_changed(&a.clone().with_home_radius(2.0)));
        assert!(a.zones_changed(&a.clone().with_monitored_categories(&["fire"])));
        assert!(a.zones_changed(
            &a.clone()
                .with_device_tracker(DeviceTrackerConfig::new("device_tracker.phone", 5.0))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        std::fs::write(
            &path,
            "instance_id = \"north\"\n[home]\nlatitude = -33.7\nlongitude = 151.1\nradius_km = 3.5\n",
        )
        .unwrap();
        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.instance_id, "north");
        assert_eq!(config.home.radius_km, 3.5);
    }
}
