//! Upstream hazard records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::zone::GeoPoint;

/// Stable identity of a hazard within the upstream feed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardId(pub String);

impl HazardId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HazardId {
    fn from(s: &str) -> Self {
        HazardId(s.to_string())
    }
}

impl From<String> for HazardId {
    fn from(s: String) -> Self {
        HazardId(s)
    }
}

impl std::fmt::Display for HazardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One upstream hazard record (incident, roadwork, fire, flood, ...).
///
/// Field names double as the keys used in change deltas, so renaming a field
/// here changes the outbound `changes` contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id: HazardId,
    pub headline: String,
    pub main_category: String,
    #[serde(default)]
    pub sub_categories: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub affected_roads: Vec<String>,
    pub location_qualifier: Option<String>,
    pub advice_a: Option<String>,
    pub advice_b: Option<String>,
    pub other_advice: Option<String>,
    pub web_link: Option<String>,
    pub impact: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub is_major: bool,
    #[serde(default)]
    pub ended: bool,
    pub duration_minutes: Option<i64>,
    pub period_type: Option<String>,
    #[serde(default)]
    pub is_event: bool,
    /// Upstream properties with no named field. Carried through untouched.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Hazard {
    /// Minimal record; every optional attribute starts empty.
    pub fn new(
        id: impl Into<HazardId>,
        headline: &str,
        main_category: &str,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Hazard {
            id: id.into(),
            headline: headline.to_string(),
            main_category: main_category.to_string(),
            sub_categories: Vec::new(),
            created_at: None,
            last_updated_at: None,
            start_at: None,
            end_at: None,
            latitude,
            longitude,
            affected_roads: Vec::new(),
            location_qualifier: None,
            advice_a: None,
            advice_b: None,
            other_advice: None,
            web_link: None,
            impact: None,
            status: None,
            is_major: false,
            ended: false,
            duration_minutes: None,
            period_type: None,
            is_event: false,
            extra: BTreeMap::new(),
        }
    }

    /// Case-normalized category used for monitoring and aggregation.
    pub fn category(&self) -> String {
        self.main_category.trim().to_lowercase()
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}
