//! Structured observability hooks for the tracker cycle.
//!
//! - `cycle_span`: a span tagged with instance and cycle id, attached to the
//!   cycle future with `tracing::Instrument`
//! - emitters for cycle start, finish and failure, and per-hazard events
//!
//! Events are emitted at `info!` (failures at `warn!`/`error!`). Filtering
//! follows `RUST_LOG`.

use tracing::{error, info, warn, Span};

use crate::domain::TrackerError;

/// Span covering one cycle.
pub fn cycle_span(instance_id: &str, cycle_id: &str) -> Span {
    tracing::info_span!("hazard.cycle", instance_id = %instance_id, cycle_id = %cycle_id)
}

pub fn emit_cycle_started(instance_id: &str, zones: usize, paths: usize) {
    info!(event = "cycle.started", instance_id = %instance_id, zones = zones, paths = paths);
}

pub fn emit_cycle_finished(
    instance_id: &str,
    duration_ms: u64,
    fetched: usize,
    nearby: usize,
    events: usize,
) {
    info!(
        event = "cycle.finished",
        instance_id = %instance_id,
        duration_ms = duration_ms,
        fetched = fetched,
        nearby = nearby,
        events = events,
    );
}

/// Auth failures log at `error!`; the key needs attention. Everything else
/// is a transient `warn!`.
pub fn emit_cycle_failed(instance_id: &str, err: &TrackerError) {
    match err {
        TrackerError::Fetch(fetch) if !fetch.is_transient() => {
            error!(event = "cycle.failed", instance_id = %instance_id, kind = fetch.kind(), error = %err);
        }
        TrackerError::Fetch(fetch) => {
            warn!(event = "cycle.failed", instance_id = %instance_id, kind = fetch.kind(), error = %err);
        }
        _ => {
            warn!(event = "cycle.failed", instance_id = %instance_id, error = %err);
        }
    }
}

pub fn emit_hazard_event(instance_id: &str, event_type: &str, hazard_id: &str) {
    info!(event = "hazard.event", instance_id = %instance_id, event_type = %event_type, hazard_id = %hazard_id);
}

pub fn emit_delivery_failed(instance_id: &str, what: &str, error: &dyn std::fmt::Display) {
    warn!(event = "delivery.failed", instance_id = %instance_id, what = %what, error = %error);
}
