//! Per-instance cycle counters.
//!
//! Counters are incremented silently at the call site. Call
//! [`CycleMetrics::flush`] to emit current values as a single
//! `tracing::info!` event (the tracker does so at the end of each cycle).

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters owned by one tracker instance.
#[derive(Debug, Default)]
pub struct CycleMetrics {
    cycles_ok: AtomicU64,
    cycles_failed: AtomicU64,
    events_emitted: AtomicU64,
    hazards_nearby: AtomicU64,
}

impl CycleMetrics {
    pub const fn new() -> Self {
        Self {
            cycles_ok: AtomicU64::new(0),
            cycles_failed: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
            hazards_nearby: AtomicU64::new(0),
        }
    }

    pub fn inc_cycles_ok(&self) {
        self.cycles_ok.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cycles_ok", "counter incremented");
    }

    pub fn inc_cycles_failed(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "cycles_failed", "counter incremented");
    }

    pub fn add_events(&self, n: u64) {
        self.events_emitted.fetch_add(n, Ordering::Relaxed);
    }

    /// Gauge: size of the last committed nearby set.
    pub fn set_hazards_nearby(&self, n: u64) {
        self.hazards_nearby.store(n, Ordering::Relaxed);
    }

    /// Emit all current values as one `info!` event.
    pub fn flush(&self, instance_id: &str) {
        tracing::info!(
            metric = "flush",
            instance_id = %instance_id,
            cycles_ok = self.cycles_ok(),
            cycles_failed = self.cycles_failed(),
            events_emitted = self.events_emitted(),
            hazards_nearby = self.hazards_nearby(),
        );
    }

    pub fn cycles_ok(&self) -> u64 {
        self.cycles_ok.load(Ordering::Relaxed)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed.load(Ordering::Relaxed)
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    pub fn hazards_nearby(&self) -> u64 {
        self.hazards_nearby.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = CycleMetrics::new();
        m.inc_cycles_ok();
        m.inc_cycles_ok();
        m.inc_cycles_failed();
        m.add_events(4);
        m.add_events(1);
        m.set_hazards_nearby(7);
        m.set_hazards_nearby(3);

        assert_eq!(m.cycles_ok(), 2);
        assert_eq!(m.cycles_failed(), 1);
        assert_eq!(m.events_emitted(), 5);
        assert_eq!(m.hazards_nearby(), 3);
    }

    #[test]
    fn instances_do_not_share_counts() {
        let a = CycleMetrics::new();
        let b = CycleMetrics::new();
        a.inc_cycles_ok();
        assert_eq!(b.cycles_ok(), 0);
    }
}
