//! Outbound events and the consumer seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregate::SummaryPayload;
use crate::diff::{Changes, DiffResult};
use crate::domain::{display_name, DeliveryError, Hazard, NearbyHazard};

/// Hazard attribute map, as carried by every per-hazard event.
pub type Attributes = Map<String, Value>;

/// A hazard entered a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHazardNearby {
    pub instance_id: String,
    pub hazard_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub attributes: Attributes,
}

/// A hazard left every zone or vanished from the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardClearedNearby {
    pub instance_id: String,
    pub hazard_id: String,
    pub name: String,
    pub attributes: Attributes,
}

/// A nearby hazard changed in a significant field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardDetailsUpdated {
    pub instance_id: String,
    pub hazard_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub attributes: Attributes,
    pub changes: Changes,
}

/// Marks the end of a successful cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardsUpdated {
    pub instance_id: String,
    pub status: String,
}

/// Serialized as `{"event_type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    NewHazardNearby(NewHazardNearby),
    HazardClearedNearby(HazardClearedNearby),
    HazardDetailsUpdated(HazardDetailsUpdated),
    HazardsUpdated(HazardsUpdated),
}

impl OutboundEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OutboundEvent::NewHazardNearby(_) => "new_hazard_nearby",
            OutboundEvent::HazardClearedNearby(_) => "hazard_cleared_nearby",
            OutboundEvent::HazardDetailsUpdated(_) => "hazard_details_updated",
            OutboundEvent::HazardsUpdated(_) => "hazards_updated",
        }
    }

    /// The hazard this event is about, if any.
    pub fn hazard_id(&self) -> Option<&str> {
        match self {
            OutboundEvent::NewHazardNearby(e) => Some(&e.hazard_id),
            OutboundEvent::HazardClearedNearby(e) => Some(&e.hazard_id),
            OutboundEvent::HazardDetailsUpdated(e) => Some(&e.hazard_id),
            OutboundEvent::HazardsUpdated(_) => None,
        }
    }

    pub fn processed(instance_id: &str) -> Self {
        OutboundEvent::HazardsUpdated(HazardsUpdated {
            instance_id: instance_id.to_string(),
            status: "processed".to_string(),
        })
    }
}

/// Attribute map for a hazard. Absent values are omitted.
pub fn attributes(hazard: &Hazard) -> Attributes {
    fn time(t: Option<DateTime<Utc>>) -> Option<Value> {
        t.map(|t| Value::String(t.to_rfc3339()))
    }
    fn text(s: &Option<String>) -> Option<Value> {
        s.as_ref().map(|s| Value::String(s.clone()))
    }

    let sub = |i: usize| hazard.sub_categories.get(i).map(|s| Value::String(s.clone()));

    let entries: Vec<(&str, Option<Value>)> = vec![
        ("hazard_id", Some(Value::String(hazard.id.to_string()))),
        ("created", time(hazard.created_at)),
        ("last_updated", time(hazard.last_updated_at)),
        ("main_category", Some(Value::String(hazard.main_category.clone()))),
        ("sub_category_a", sub(0)),
        ("sub_category_b", sub(1)),
        ("sub_category_c", sub(2)),
        ("sub_category_d", sub(3)),
        ("roads", Some(Value::from(hazard.affected_roads.clone()))),
        ("location_qualifier", text(&hazard.location_qualifier)),
        ("start_time", time(hazard.start_at)),
        ("end_time", time(hazard.end_at)),
        ("duration_minutes", hazard.duration_minutes.map(Value::from)),
        ("period_type", text(&hazard.period_type)),
        ("advice_a", text(&hazard.advice_a)),
        ("advice_b", text(&hazard.advice_b)),
        ("other_advice", text(&hazard.other_advice)),
        ("web_link", text(&hazard.web_link)),
        ("is_major", Some(Value::Bool(hazard.is_major))),
        ("impact", text(&hazard.impact)),
        ("status", text(&hazard.status)),
        ("ended", Some(Value::Bool(hazard.ended))),
        ("is_event", Some(Value::Bool(hazard.is_event))),
        ("hazard_type_dn", Some(Value::String(display_name(&hazard.main_category)))),
    ];

    entries
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect()
}

fn new_event(instance_id: &str, nearby: &NearbyHazard) -> OutboundEvent {
    let h = &nearby.hazard;
    OutboundEvent::NewHazardNearby(NewHazardNearby {
        instance_id: instance_id.to_string(),
        hazard_id: h.id.to_string(),
        name: h.headline.clone(),
        latitude: h.latitude,
        longitude: h.longitude,
        attributes: attributes(h),
    })
}

fn cleared_event(instance_id: &str, nearby: &NearbyHazard) -> OutboundEvent {
    let h = &nearby.hazard;
    OutboundEvent::HazardClearedNearby(HazardClearedNearby {
        instance_id: instance_id.to_string(),
        hazard_id: h.id.to_string(),
        name: h.headline.clone(),
        attributes: attributes(h),
    })
}

fn updated_event(instance_id: &str, nearby: &NearbyHazard, changes: &Changes) -> OutboundEvent {
    let h = &nearby.hazard;
    OutboundEvent::HazardDetailsUpdated(HazardDetailsUpdated {
        instance_id: instance_id.to_string(),
        hazard_id: h.id.to_string(),
        name: h.headline.clone(),
        latitude: h.latitude,
        longitude: h.longitude,
        attributes: attributes(h),
        changes: changes.clone(),
    })
}

/// One event per diff result, in diff order.
pub fn to_events(instance_id: &str, diffs: &[DiffResult]) -> Vec<OutboundEvent> {
    diffs
        .iter()
        .map(|diff| match diff {
            DiffResult::New(h) => new_event(instance_id, h),
            DiffResult::Cleared(h) => cleared_event(instance_id, h),
            DiffResult::Updated { current, changes } => updated_event(instance_id, current, changes),
        })
        .collect()
}

/// Receives what a cycle produced.
///
/// Called only after the cycle committed. A delivery error is logged by the
/// tracker and does not undo the commit.
#[async_trait]
pub trait HazardConsumer: Send + Sync {
    async fn deliver_events(&self, events: &[OutboundEvent]) -> Result<(), DeliveryError>;

    async fn deliver_summaries(&self, summaries: &[SummaryPayload]) -> Result<(), DeliveryError>;
}

/// In-memory consumer for tests and embedding.
pub mod fakes {
    use tokio::sync::Mutex;

    use super::*;

    /// Records everything delivered to it.
    #[derive(Debug, Default)]
    pub struct MemoryConsumer {
        events: Mutex<Vec<OutboundEvent>>,
        summaries: Mutex<Vec<Vec<SummaryPayload>>>,
        fail: std::sync::atomic::AtomicBool,
        delay: Mutex<Option<std::time::Duration>>,
    }

    impl MemoryConsumer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make subsequent deliveries fail.
        pub fn fail_deliveries(&self, fail: bool) {
            self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
        }

        /// Hold each event delivery for `delay` before recording it.
        pub async fn set_delivery_delay(&self, delay: std::time::Duration) {
            *self.delay.lock().await = Some(delay);
        }

        pub async fn events(&self) -> Vec<OutboundEvent> {
            self.events.lock().await.clone()
        }

        /// Drain recorded events.
        pub async fn take_events(&self) -> Vec<OutboundEvent> {
            std::mem::take(&mut *self.events.lock().await)
        }

        /// The most recently delivered summary batch.
        pub async fn last_summaries(&self) -> Option<Vec<SummaryPayload>> {
            self.summaries.lock().await.last().cloned()
        }

        pub async fn summary_batches(&self) -> usize {
            self.summaries.lock().await.len()
        }

        fn check(&self) -> Result<(), DeliveryError> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                Err(DeliveryError("consumer unavailable".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl HazardConsumer for MemoryConsumer {
        async fn deliver_events(&self, events: &[OutboundEvent]) -> Result<(), DeliveryError> {
            let delay = *self.delay.lock().await;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.check()?;
            self.events.lock().await.extend_from_slice(events);
            Ok(())
        }

        async fn deliver_summaries(&self, summaries: &[SummaryPayload]) -> Result<(), DeliveryError> {
            self.check()?;
            self.summaries.lock().await.push(summaries.to_vec());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::FieldChange;
    use crate::domain::{ZoneKind, ZoneMatch};
    use chrono::TimeZone;
    use serde_json::json;

    fn nearby(hazard: Hazard) -> NearbyHazard {
        NearbyHazard::new(
            hazard,
            vec![ZoneMatch {
                zone_name: "home".into(),
                zone_kind: ZoneKind::Home,
                distance_km: 1.0,
            }],
        )
        .unwrap()
    }

    #[test]
    fn attributes_omit_absent_values() {
        let mut hazard = Hazard::new("77", "Crash", "ACCIDENT", -33.9, 151.2);
        hazard.sub_categories = vec!["Multi-vehicle".into()];
        hazard.last_updated_at = Utc.timestamp_millis_opt(1_700_000_000_000).single();
        hazard.affected_roads = vec!["M4".into()];

        let attrs = attributes(&hazard);
        assert_eq!(attrs["hazard_id"], json!("77"));
        assert_eq!(attrs["sub_category_a"], json!("Multi-vehicle"));
        assert!(!attrs.contains_key("sub_category_b"));
        assert!(!attrs.contains_key("created"));
        assert!(!attrs.contains_key("advice_a"));
        assert_eq!(attrs["last_updated"], json!("2023-11-14T22:13:20+00:00"));
        assert_eq!(attrs["roads"], json!(["M4"]));
        assert_eq!(attrs["is_major"], json!(false));
        assert_eq!(attrs["hazard_type_dn"], json!("Accidents"));
    }

    #[test]
    fn one_event_per_diff_in_order() {
        let a = nearby(Hazard::new("a", "Gone", "fire", 0.0, 0.0));
        let b = nearby(Hazard::new("b", "Arrived", "fire", 0.0, 0.0));
        let c = nearby(Hazard::new("c", "Changed", "fire", 0.0, 0.0));
        let mut changes = Changes::new();
        changes.insert(
            "is_major".into(),
            FieldChange {
                old: json!(false),
                new: json!(true),
            },
        );

        let diffs = vec![
            DiffResult::Cleared(a),
            DiffResult::New(b),
            DiffResult::Updated { current: c, changes },
        ];
        let events = to_events("north", &diffs);

        let kinds: Vec<_> = events.iter().map(|e| e.event_type()).collect();
        assert_eq!(
            kinds,
            vec!["hazard_cleared_nearby", "new_hazard_nearby", "hazard_details_updated"]
        );
        let ids: Vec<_> = events.iter().filter_map(|e| e.hazard_id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn event_wire_shape() {
        let event = to_events(
            "north",
            &[DiffResult::New(nearby(Hazard::new("5", "Crash", "accident", -33.5, 151.5)))],
        )
        .remove(0);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], json!("new_hazard_nearby"));
        assert_eq!(value["data"]["instance_id"], json!("north"));
        assert_eq!(value["data"]["hazard_id"], json!("5"));
        assert_eq!(value["data"]["name"], json!("Crash"));
        assert_eq!(value["data"]["latitude"], json!(-33.5));

        let processed = serde_json::to_value(OutboundEvent::processed("north")).unwrap();
        assert_eq!(
            processed,
            json!({"event_type": "hazards_updated", "data": {"instance_id": "north", "status": "processed"}})
        );
    }
}
