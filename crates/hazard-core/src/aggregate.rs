//! Per-category aggregation of the current nearby set.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{summary_name, NearbyHazard, NearbySet, ZoneMatch, ATTRIBUTION};

/// Hazards of one category near any zone.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    /// Sorted by primary distance, then id.
    pub hazards: Vec<NearbyHazard>,
    pub most_recent_update: Option<DateTime<Utc>>,
}

impl CategorySummary {
    fn empty(category: &str) -> Self {
        CategorySummary {
            category: category.to_string(),
            count: 0,
            hazards: Vec::new(),
            most_recent_update: None,
        }
    }

    fn push(&mut self, hazard: &NearbyHazard) {
        self.count += 1;
        if let Some(updated) = hazard.hazard.last_updated_at {
            self.most_recent_update = Some(match self.most_recent_update {
                Some(current) => current.max(updated),
                None => updated,
            });
        }
        self.hazards.push(hazard.clone());
    }

    fn finish(mut self) -> Self {
        self.hazards.sort_by(|a, b| {
            a.primary_match()
                .distance_km
                .total_cmp(&b.primary_match().distance_km)
                .then_with(|| a.id().cmp(b.id()))
        });
        self
    }

    /// Outbound shape of this summary.
    pub fn payload(&self) -> SummaryPayload {
        SummaryPayload {
            category: self.category.clone(),
            name: summary_name(&self.category),
            attribution: ATTRIBUTION.to_string(),
            count: self.count,
            last_updated_list: self.most_recent_update.map(|t| t.to_rfc3339()),
            nearby_hazards_list: self.hazards.iter().map(NearbyHazardItem::from).collect(),
        }
    }
}

/// Group the nearby set by category. Only categories present in `current`
/// appear.
pub fn summarize(current: &NearbySet) -> BTreeMap<String, CategorySummary> {
    let mut out: BTreeMap<String, CategorySummary> = BTreeMap::new();
    for hazard in current.iter() {
        out.entry(hazard.category().to_string())
            .or_insert_with(|| CategorySummary::empty(hazard.category()))
            .push(hazard);
    }
    out.into_iter().map(|(k, v)| (k, v.finish())).collect()
}

/// Like [`summarize`], but every monitored category is present, with a zero
/// count when nothing of that category is nearby.
pub fn summarize_monitored(
    current: &NearbySet,
    monitored: &BTreeSet<String>,
) -> BTreeMap<String, CategorySummary> {
    let mut out = summarize(current);
    for category in monitored {
        out.entry(category.clone())
            .or_insert_with(|| CategorySummary::empty(category));
    }
    out
}

/// Outbound per-category summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub category: String,
    pub name: String,
    pub attribution: String,
    pub count: usize,
    /// Latest `last_updated` across the category's hazards.
    pub last_updated_list: Option<String>,
    pub nearby_hazards_list: Vec<NearbyHazardItem>,
}

/// One entry of `nearby_hazards_list`. Distance and zone fields describe the
/// nearest match; `zones` lists all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyHazardItem {
    pub hazard_id: String,
    pub headline: String,
    pub main_category: String,
    pub last_updated: Option<String>,
    pub distance_km: f64,
    pub zone_type: String,
    pub zone_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub web_link: Option<String>,
    pub other_advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category_a: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roads: Vec<String>,
    #[serde(default)]
    pub is_major: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(default)]
    pub ended: bool,
    pub zones: Vec<ZoneMatch>,
}

impl From<&NearbyHazard> for NearbyHazardItem {
    fn from(nearby: &NearbyHazard) -> Self {
        let hazard = &nearby.hazard;
        let primary = nearby.primary_match();
        NearbyHazardItem {
            hazard_id: hazard.id.to_string(),
            headline: hazard.headline.clone(),
            main_category: hazard.main_category.clone(),
            last_updated: hazard.last_updated_at.map(|t| t.to_rfc3339()),
            distance_km: round2(primary.distance_km),
            zone_type: primary.zone_kind.to_string(),
            zone_name: primary.zone_name.clone(),
            latitude: hazard.latitude,
            longitude: hazard.longitude,
            web_link: hazard.web_link.clone(),
            other_advice: hazard.other_advice.clone(),
            created: hazard.created_at.map(|t| t.to_rfc3339()),
            sub_category_a: hazard.sub_categories.first().cloned(),
            roads: hazard.affected_roads.clone(),
            is_major: hazard.is_major,
            impact: hazard.impact.clone(),
            ended: hazard.ended,
            zones: nearby
                .matches()
                .iter()
                .map(|m| ZoneMatch {
                    distance_km: round2(m.distance_km),
                    ..m.clone()
                })
                .collect(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
