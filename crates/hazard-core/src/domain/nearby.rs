//! The per-cycle nearby set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::hazard::{Hazard, HazardId};
use super::zone::ZoneMatch;

/// A hazard inside at least one zone, with every zone it matched.
///
/// Deserialization goes through [`NearbyHazard::new`], so a stored entry
/// without matches is rejected rather than loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NearbyHazardRecord")]
pub struct NearbyHazard {
    pub hazard: Hazard,
    /// Lower-cased `main_category`.
    category: String,
    /// Never empty; sorted by ascending distance.
    matches: Vec<ZoneMatch>,
}

#[derive(Deserialize)]
struct NearbyHazardRecord {
    hazard: Hazard,
    matches: Vec<ZoneMatch>,
}

impl TryFrom<NearbyHazardRecord> for NearbyHazard {
    type Error = String;

    fn try_from(record: NearbyHazardRecord) -> Result<Self, Self::Error> {
        let id = record.hazard.id.clone();
        NearbyHazard::new(record.hazard, record.matches)
            .ok_or_else(|| format!("nearby hazard {id} has no zone matches"))
    }
}

impl NearbyHazard {
    /// Returns `None` when `matches` is empty: such a hazard is not nearby.
    pub fn new(hazard: Hazard, mut matches: Vec<ZoneMatch>) -> Option<Self> {
        if matches.is_empty() {
            return None;
        }
        matches.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.zone_name.cmp(&b.zone_name))
        });
        Some(NearbyHazard {
            category: hazard.category(),
            hazard,
            matches,
        })
    }

    pub fn id(&self) -> &HazardId {
        &self.hazard.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Every matched zone, nearest first.
    pub fn matches(&self) -> &[ZoneMatch] {
        &self.matches
    }

    /// The nearest zone match.
    pub fn primary_match(&self) -> &ZoneMatch {
        &self.matches[0]
    }
}

/// Hazards near any zone for one cycle, keyed by identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NearbySet {
    hazards: BTreeMap<HazardId, NearbyHazard>,
}

impl NearbySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the identity is already present. Returns whether the
    /// hazard was inserted.
    pub fn insert_first(&mut self, hazard: NearbyHazard) -> bool {
        use std::collections::btree_map::Entry;
        match self.hazards.entry(hazard.id().clone()) {
            Entry::Vacant(slot) => {
                slot.insert(hazard);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, id: &HazardId) -> Option<&NearbyHazard> {
        self.hazards.get(id)
    }

    pub fn contains(&self, id: &HazardId) -> bool {
        self.hazards.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &HazardId> {
        self.hazards.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NearbyHazard> {
        self.hazards.values()
    }

    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }
}

impl FromIterator<NearbyHazard> for NearbySet {
    fn from_iter<T: IntoIterator<Item = NearbyHazard>>(iter: T) -> Self {
        let mut set = NearbySet::new();
        for hazard in iter {
            set.insert_first(hazard);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ZoneKind;

    fn zone_match(name: &str, kind: ZoneKind, distance_km: f64) -> ZoneMatch {
        ZoneMatch {
            zone_name: name.to_string(),
            zone_kind: kind,
            distance_km,
        }
    }

    #[test]
    fn nearby_hazard_requires_a_match() {
        let hazard = Hazard::new("1", "Crash", "accident", -33.8, 151.2);
        assert!(NearbyHazard::new(hazard, Vec::new()).is_none());
    }

    #[test]
    fn matches_sorted_nearest_first() {
        let hazard = Hazard::new("1", "Crash", "Accident", -33.8, 151.2);
        let nearby = NearbyHazard::new(
            hazard,
            vec![
                zone_match("home", ZoneKind::Home, 4.0),
                zone_match("device_tracker.phone", ZoneKind::DeviceTracker, 1.5),
            ],
        )
        .unwrap();
        assert_eq!(nearby.category(), "accident");
        assert_eq!(nearby.primary_match().zone_name, "device_tracker.phone");
        assert_eq!(nearby.matches().len(), 2);
    }

    #[test]
    fn insert_first_keeps_first_identity() {
        let first = NearbyHazard::new(
            Hazard::new("1", "First", "fire", 0.0, 0.0),
            vec![zone_match("home", ZoneKind::Home, 1.0)],
        )
        .unwrap();
        let second = NearbyHazard::new(
            Hazard::new("1", "Second", "fire", 0.0, 0.0),
            vec![zone_match("home", ZoneKind::Home, 1.0)],
        )
        .unwrap();

        let mut set = NearbySet::new();
        assert!(set.insert_first(first));
        assert!(!set.insert_first(second));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&HazardId::from("1")).unwrap().hazard.headline, "First");
    }

    #[test]
    fn deserializing_requires_a_match() {
        let hazard = serde_json::to_value(Hazard::new("1", "Crash", "Accident", -33.8, 151.2)).unwrap();
        let empty = serde_json::json!({"hazard": hazard, "category": "accident", "matches": []});
        assert!(serde_json::from_value::<NearbyHazard>(empty).is_err());

        let one = serde_json::json!({
            "hazard": hazard,
            "matches": [{"zone_name": "home", "zone_kind": "home", "distance_km": 2.0}]
        });
        let nearby: NearbyHazard = serde_json::from_value(one).unwrap();
        assert_eq!(nearby.category(), "accident");
        assert_eq!(nearby.primary_match().zone_name, "home");
    }
}
