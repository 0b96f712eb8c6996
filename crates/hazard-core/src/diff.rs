//! Diff engine: classify every identity of two consecutive nearby sets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Hazard, HazardId, NearbyHazard, NearbySet};

/// Hazard fields whose change is newsworthy. `last_updated_at`, timestamps
/// other than `end_at`, coordinates and the passthrough map are deliberately
/// absent.
pub const SIGNIFICANT_FIELDS: &[&str] = &[
    "ended",
    "is_major",
    "status",
    "impact",
    "main_category",
    "affected_roads",
    "advice_a",
    "advice_b",
    "other_advice",
    "end_at",
];

/// Old and new value of one significant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Significant field name → change.
pub type Changes = BTreeMap<String, FieldChange>;

/// Classification of one identity between two cycles.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffResult {
    New(NearbyHazard),
    /// Carries the last-known snapshot so consumers can report what went away.
    Cleared(NearbyHazard),
    Updated {
        current: NearbyHazard,
        changes: Changes,
    },
}

impl DiffResult {
    pub fn id(&self) -> &HazardId {
        match self {
            DiffResult::New(h) | DiffResult::Cleared(h) => h.id(),
            DiffResult::Updated { current, .. } => current.id(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DiffResult::New(_) => "new",
            DiffResult::Cleared(_) => "cleared",
            DiffResult::Updated { .. } => "updated",
        }
    }
}

// ---------------------------------------------------------------------------
// Field-level diff
// ---------------------------------------------------------------------------

/// Diff two JSON objects at the given top-level fields.
///
/// A field absent on one side compares as `null`. Fields equal on both sides
/// are skipped.
pub fn diff_scoped_fields(a: &Value, b: &Value, fields: &[&str]) -> Changes {
    fields
        .iter()
        .filter_map(|field| {
            let pointer = format!("/{field}");
            let before = a.pointer(&pointer).unwrap_or(&Value::Null);
            let after = b.pointer(&pointer).unwrap_or(&Value::Null);

            if before == after {
                None
            } else {
                Some((
                    (*field).to_string(),
                    FieldChange {
                        old: before.clone(),
                        new: after.clone(),
                    },
                ))
            }
        })
        .collect()
}

/// Significant-field delta between two snapshots of the same hazard.
pub fn significant_changes(previous: &Hazard, current: &Hazard) -> Changes {
    // Hazard has string keys and plain field types, so conversion cannot fail.
    let before = serde_json::to_value(previous).unwrap_or(Value::Null);
    let after = serde_json::to_value(current).unwrap_or(Value::Null);
    diff_scoped_fields(&before, &after, SIGNIFICANT_FIELDS)
}

// ---------------------------------------------------------------------------
// Set diff
// ---------------------------------------------------------------------------

/// Compare the previous and current nearby sets.
///
/// Every identity in `previous ∪ current` lands in at most one result;
/// unchanged identities produce none. Output order is cleared, new, updated,
/// each ascending by id.
pub fn diff_nearby(previous: &NearbySet, current: &NearbySet) -> Vec<DiffResult> {
    let mut cleared = Vec::new();
    let mut new = Vec::new();
    let mut updated = Vec::new();

    for old in previous.iter() {
        if !current.contains(old.id()) {
            cleared.push(DiffResult::Cleared(old.clone()));
        }
    }

    for now in current.iter() {
        match previous.get(now.id()) {
            None => new.push(DiffResult::New(now.clone())),
            Some(old) => {
                let changes = significant_changes(&old.hazard, &now.hazard);
                if !changes.is_empty() {
                    updated.push(DiffResult::Updated {
                        current: now.clone(),
                        changes,
                    });
                }
            }
        }
    }

    cleared.into_iter().chain(new).chain(updated).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scoped_fields_identical_produce_nothing() {
        let v = json!({"ended": false, "impact": "Moderate"});
        assert!(diff_scoped_fields(&v, &v, &["ended", "impact"]).is_empty());
    }

    #[test]
    fn scoped_fields_absent_compares_as_null() {
        let a = json!({"impact": "Minor"});
        let b = json!({});
        let changes = diff_scoped_fields(&a, &b, &["impact", "status"]);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes["impact"],
            FieldChange {
                old: json!("Minor"),
                new: Value::Null
            }
        );
    }

    #[test]
    fn significant_fields_are_real_hazard_keys() {
        let value = serde_json::to_value(Hazard::new("1", "x", "fire", 0.0, 0.0)).unwrap();
        for field in SIGNIFICANT_FIELDS {
            assert!(value.get(field).is_some(), "{field} is not a Hazard field");
        }
    }

    #[test]
    fn road_order_change_is_significant() {
        let mut a = Hazard::new("1", "Crash", "accident", 0.0, 0.0);
        a.affected_roads = vec!["M1".into(), "Pacific Hwy".into()];
        let mut b = a.clone();
        b.affected_roads = vec!["Pacific Hwy".into(), "M1".into()];
        let changes = significant_changes(&a, &b);
        assert!(changes.contains_key("affected_roads"));
    }

    #[test]
    fn extra_fields_are_never_significant() {
        let a = Hazard::new("1", "Crash", "accident", 0.0, 0.0);
        let mut b = a.clone();
        b.extra.insert("displayOrder".into(), json!(4));
        b.headline = "Crash cleared from lane".into();
        assert!(significant_changes(&a, &b).is_empty());
    }
}
