//! Daemon configuration file: the tracker settings plus feed access and the
//! optional state snapshot path.

use std::path::{Path, PathBuf};

use hazard_core::{ConfigError, TrackerConfig};
use hazard_feed::FeedConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(flatten)]
    pub tracker: TrackerConfig,

    /// Overridden by `--api-key` / `HAZARD_FEED_API_KEY`. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub feed: FeedConfig,

    /// Keep the nearby set on disk so a restart does not re-announce
    /// everything as new.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl DaemonConfig {
    /// Parse, apply the key override and validate.
    pub fn from_toml_str(raw: &str, api_key_override: Option<String>) -> Result<Self, ConfigError> {
        let mut config: DaemonConfig = toml::from_str(raw)?;
        if let Some(key) = api_key_override.filter(|k| !k.trim().is_empty()) {
            config.api_key = Some(key);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>, api_key_override: Option<String>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw, api_key_override)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tracker.validate()?;
        self.feed_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Feed settings with the resolved API key.
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            ..self.feed.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        api_key = "file-key"

        [home]
        latitude = -33.8688
        longitude = 151.2093
    "#;

    #[test]
    fn minimal_file_gets_defaults() {
        let config = DaemonConfig::from_toml_str(MINIMAL, None).unwrap();
        assert_eq!(config.tracker.update_interval_seconds, 300);
        assert_eq!(config.tracker.home.radius_km, 10.0);
        assert_eq!(config.feed.timeout_seconds, 20);
        assert_eq!(config.feed_config().api_key, "file-key");
        assert!(config.state_file.is_none());
    }

    #[test]
    fn full_file() {
        let config = DaemonConfig::from_toml_str(
            r#"
            instance_id = "north-shore"
            api_key = "k"
            update_interval_seconds = 120
            monitored_categories = ["accident", "roadwork"]
            state_file = "/var/lib/hazardd/state.json"

            [feed]
            base_url = "http://localhost:9000/hazards"
            timeout_seconds = 5

            [home]
            name = "house"
            latitude = -33.80
            longitude = 151.18
            radius_km = 7.5

            [[device_trackers]]
            id = "device_tracker.phone"
            radius_km = 3

            [[device_trackers]]
            id = "device_tracker.car"
            latitude = -33.9
            longitude = 151.2
            "#,
            None,
        )
        .unwrap();

        assert_eq!(config.tracker.instance_id, "north-shore");
        assert_eq!(config.tracker.update_interval_seconds, 120);
        assert_eq!(config.tracker.home.name, "house");
        assert_eq!(config.tracker.device_trackers.len(), 2);
        assert_eq!(config.tracker.device_trackers[0].radius_km, 3.0);
        assert_eq!(config.tracker.device_trackers[1].radius_km, 5.0);
        assert_eq!(config.feed.base_url, "http://localhost:9000/hazards");
        assert_eq!(config.state_file.as_deref(), Some(Path::new("/var/lib/hazardd/state.json")));
    }

    #[test]
    fn override_replaces_file_key() {
        let config = DaemonConfig::from_toml_str(MINIMAL, Some("env-key".into())).unwrap();
        assert_eq!(config.feed_config().api_key, "env-key");
    }

    #[test]
    fn missing_key_is_rejected() {
        let raw = "[home]\nlatitude = -33.0\nlongitude = 151.0\n";
        let err = DaemonConfig::from_toml_str(raw, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("API key")));

        DaemonConfig::from_toml_str(raw, Some("k".into())).unwrap();
    }

    #[test]
    fn tracker_rules_still_apply() {
        let raw = format!("{MINIMAL}\n");
        let raw = raw.replace("api_key = \"file-key\"", "api_key = \"k\"\nupdate_interval_seconds = 30");
        let err = DaemonConfig::from_toml_str(&raw, None).unwrap_err();
        assert!(matches!(err, ConfigError::IntervalTooShort { .. }));
    }

    #[test]
    fn zero_timeout_rejected() {
        let raw = format!("{MINIMAL}\n[feed]\ntimeout_seconds = 0\n");
        assert!(DaemonConfig::from_toml_str(&raw, None).is_err());
    }

    #[test]
    fn missing_home_is_a_parse_error() {
        let err = DaemonConfig::from_toml_str("api_key = \"k\"\n", None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn serialized_config_hides_the_key() {
        let config = DaemonConfig::from_toml_str(MINIMAL, None).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("file-key"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hazardd.toml");
        std::fs::write(&path, MINIMAL).unwrap();
        let config = DaemonConfig::load(&path, None).unwrap();
        assert_eq!(config.tracker.instance_id, "default");
    }
}
