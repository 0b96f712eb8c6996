//! Proximity filter: raw hazards + zones → deduplicated nearby set.

use std::collections::BTreeSet;

use tracing::debug;

use crate::domain::{Hazard, NearbyHazard, NearbySet, Zone, ZoneMatch};

/// Every zone `hazard` falls inside, inclusive of the boundary.
pub fn match_zones(hazard: &Hazard, zones: &[Zone]) -> Vec<ZoneMatch> {
    let location = hazard.location();
    zones
        .iter()
        .filter_map(|zone| zone.match_point(&location))
        .collect()
}

/// Build the nearby set for one cycle.
///
/// Hazards whose category is not in `monitored` (lower-case) are dropped
/// before any distance is computed. A hazard inside several zones is kept
/// once, carrying all of its matches. When the snapshot repeats an identity
/// the first record wins.
pub fn filter_nearby(hazards: &[Hazard], zones: &[Zone], monitored: &BTreeSet<String>) -> NearbySet {
    let mut nearby = NearbySet::new();

    for hazard in hazards {
        if !monitored.contains(&hazard.category()) {
            continue;
        }
        if nearby.contains(&hazard.id) {
            debug!(hazard_id = %hazard.id, "duplicate hazard id in snapshot, keeping first");
            continue;
        }

        let matches = match_zones(hazard, zones);
        if let Some(entry) = NearbyHazard::new(hazard.clone(), matches) {
            nearby.insert_first(entry);
        }
    }

    nearby
}
