//! The per-instance tracker context.
//!
//! A [`HazardTracker`] owns everything one configured instance needs: its
//! validated config, the fetcher, the location source, the state store, the
//! consumer and its counters. Cycles are serialized by an internal lock, so
//! a manual trigger racing the timer still runs one cycle at a time.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::{summarize_monitored, SummaryPayload};
use crate::config::TrackerConfig;
use crate::diff::{diff_nearby, DiffResult};
use crate::dispatch::{to_events, HazardConsumer, OutboundEvent};
use crate::domain::{FetchError, Result, TrackerError};
use crate::fetch::HazardFetcher;
use crate::location::{resolve_zones, LocationSource};
use crate::metrics::CycleMetrics;
use crate::obs;
use crate::proximity::filter_nearby;
use crate::store::HazardStateStore;

/// What one successful cycle did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    /// Raw hazards returned by the fetcher.
    pub fetched: usize,
    /// Size of the committed nearby set.
    pub nearby: usize,
    pub diffs: Vec<DiffResult>,
    /// Per-hazard events followed by the closing `hazards_updated`.
    pub events: Vec<OutboundEvent>,
    pub summaries: Vec<SummaryPayload>,
}

pub struct HazardTracker {
    config: RwLock<TrackerConfig>,
    fetcher: Arc<dyn HazardFetcher>,
    locations: Arc<dyn LocationSource>,
    store: Arc<dyn HazardStateStore>,
    consumer: Arc<dyn HazardConsumer>,
    metrics: CycleMetrics,
    cycle_lock: Mutex<()>,
}

impl HazardTracker {
    /// Build a tracker. The config is validated here and never again.
    pub fn new(
        config: TrackerConfig,
        fetcher: Arc<dyn HazardFetcher>,
        locations: Arc<dyn LocationSource>,
        store: Arc<dyn HazardStateStore>,
        consumer: Arc<dyn HazardConsumer>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(HazardTracker {
            config: RwLock::new(config),
            fetcher,
            locations,
            store,
            consumer,
            metrics: CycleMetrics::new(),
            cycle_lock: Mutex::new(()),
        })
    }

    pub async fn config(&self) -> TrackerConfig {
        self.config.read().await.clone()
    }

    pub fn metrics(&self) -> &CycleMetrics {
        &self.metrics
    }

    /// One fetch to check the credential. `Auth` is returned as an error;
    /// transient failures are logged and setup carries on.
    pub async fn validate_credentials(&self) -> Result<()> {
        let config = self.config().await;
        match self.fetcher.fetch(&config.feed_paths()).await {
            Ok(hazards) => {
                debug!(instance_id = %config.instance_id, fetched = hazards.len(), "credentials accepted");
                Ok(())
            }
            Err(err @ FetchError::Auth { .. }) => Err(err.into()),
            Err(err) => {
                warn!(
                    instance_id = %config.instance_id,
                    kind = err.kind(),
                    error = %err,
                    "could not verify credentials, continuing"
                );
                Ok(())
            }
        }
    }

    /// Run one full cycle.
    ///
    /// Any error before the commit leaves the store exactly as it was.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.run_cycle_until(std::future::pending()).await
    }

    /// Run one cycle, abandoning it if `cancel` resolves while the fetch is
    /// in flight. Returns [`TrackerError::Cancelled`] in that case. Once the
    /// fetch has returned, commit and delivery always run to completion.
    pub async fn run_cycle_until<F>(&self, cancel: F) -> Result<CycleReport>
    where
        F: Future<Output = ()> + Send,
    {
        let _serial = self.cycle_lock.lock().await;
        let config = self.config().await;
        let cycle_id = Uuid::new_v4();
        let span = obs::cycle_span(&config.instance_id, &cycle_id.to_string());

        let result = self.cycle(&config, cycle_id, cancel).instrument(span).await;
        match &result {
            Ok(report) => {
                self.metrics.inc_cycles_ok();
                self.metrics.add_events(report.events.len() as u64);
                self.metrics.set_hazards_nearby(report.nearby as u64);
            }
            Err(TrackerError::Cancelled) => {
                info!(instance_id = %config.instance_id, %cycle_id, "cycle cancelled during fetch");
            }
            Err(err) => {
                self.metrics.inc_cycles_failed();
                obs::emit_cycle_failed(&config.instance_id, err);
            }
        }
        self.metrics.flush(&config.instance_id);
        result
    }

    async fn cycle<F>(&self, config: &TrackerConfig, cycle_id: Uuid, cancel: F) -> Result<CycleReport>
    where
        F: Future<Output = ()> + Send,
    {
        let started = Instant::now();
        let instance_id = config.instance_id.as_str();
        let monitored = config.normalized_categories();
        let paths = config.feed_paths();
        let zones = resolve_zones(config, self.locations.as_ref()).await;
        obs::emit_cycle_started(instance_id, zones.len(), paths.len());

        let hazards = tokio::select! {
            biased;
            _ = cancel => return Err(TrackerError::Cancelled),
            fetched = self.fetcher.fetch(&paths) => fetched?,
        };
        let current = filter_nearby(&hazards, &zones, &monitored);
        let previous = self.store.load().await?;
        let diffs = diff_nearby(&previous, &current);

        self.store.commit(current.clone()).await?;

        let summaries: Vec<SummaryPayload> = summarize_monitored(&current, &monitored)
            .values()
            .map(|s| s.payload())
            .collect();

        let mut events = to_events(instance_id, &diffs);
        for event in &events {
            if let Some(hazard_id) = event.hazard_id() {
                obs::emit_hazard_event(instance_id, event.event_type(), hazard_id);
            }
        }
        events.push(OutboundEvent::processed(instance_id));

        if let Err(err) = self.consumer.deliver_events(&events).await {
            obs::emit_delivery_failed(instance_id, "events", &err);
        }
        if let Err(err) = self.consumer.deliver_summaries(&summaries).await {
            obs::emit_delivery_failed(instance_id, "summaries", &err);
        }

        obs::emit_cycle_finished(
            instance_id,
            started.elapsed().as_millis() as u64,
            hazards.len(),
            current.len(),
            events.len(),
        );

        Ok(CycleReport {
            cycle_id,
            fetched: hazards.len(),
            nearby: current.len(),
            diffs,
            events,
            summaries,
        })
    }

    /// Summaries of the last committed nearby set.
    pub async fn summaries(&self) -> Result<Vec<SummaryPayload>> {
        let monitored = self.config.read().await.normalized_categories();
        let committed = self.store.load().await?;
        Ok(summarize_monitored(&committed, &monitored)
            .values()
            .map(|s| s.payload())
            .collect())
    }

    /// Swap in a new configuration. Waits for any running cycle. The stored
    /// baseline is discarded when zones, radii or categories change, so the
    /// next cycle reports everything nearby as new. The location source is
    /// reseeded from the new device trackers.
    pub async fn reconfigure(&self, new_config: TrackerConfig) -> Result<()> {
        new_config.validate()?;
        let _serial = self.cycle_lock.lock().await;
        let mut config = self.config.write().await;

        if config.zones_changed(&new_config) {
            self.store.clear().await?;
            info!(instance_id = %new_config.instance_id, "zones changed, state cleared");
        }
        *config = new_config;
        self.locations.reconfigure(&config).await;
        Ok(())
    }

    /// Wait for any running cycle, then optionally discard the stored state.
    pub async fn shutdown(&self, clear_state: bool) -> Result<()> {
        let _serial = self.cycle_lock.lock().await;
        if clear_state {
            self.store.clear().await?;
        }
        let instance_id = self.config.read().await.instance_id.clone();
        info!(instance_id = %instance_id, clear_state, "tracker shut down");
        Ok(())
    }
}
