//! Periodic cycle driver.
//!
//! One loop per tracker: an interval timer (first tick immediate, missed
//! ticks skipped), a manual trigger channel and a shutdown `watch`. The cycle
//! is awaited inside the loop, so two cycles never overlap. Shutdown cancels
//! an in-flight fetch; a cycle past its fetch finishes committing and
//! delivering before the loop exits.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::TrackerError;
use crate::tracker::HazardTracker;

/// Control side of a running [`Scheduler`].
///
/// Dropping the handle stops the scheduler as if `shutdown` had been called.
pub struct SchedulerHandle {
    trigger_tx: mpsc::Sender<()>,
    shutdown_tx: watch::Sender<bool>,
}

impl SchedulerHandle {
    /// Ask for an immediate cycle. Returns `false` once the scheduler is gone.
    /// Triggers arriving while a cycle runs are queued (up to a few) and run
    /// afterwards.
    pub async fn trigger(&self) -> bool {
        self.trigger_tx.send(()).await.is_ok()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

pub struct Scheduler {
    tracker: Arc<HazardTracker>,
    period: Duration,
    trigger_rx: mpsc::Receiver<()>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    /// Scheduler ticking every `period`. The period is fixed for the
    /// scheduler's lifetime.
    pub fn new(tracker: Arc<HazardTracker>, period: Duration) -> (Self, SchedulerHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (
            Scheduler {
                tracker,
                period,
                trigger_rx,
                shutdown_rx,
            },
            SchedulerHandle {
                trigger_tx,
                shutdown_tx,
            },
        )
    }

    /// Scheduler using the tracker's configured `update_interval_seconds`.
    pub async fn for_tracker(tracker: Arc<HazardTracker>) -> (Self, SchedulerHandle) {
        let period = tracker.config().await.update_interval();
        Self::new(tracker, period)
    }

    /// Run until shutdown. Cycle failures are logged by the tracker and the
    /// loop carries on with the next tick.
    pub async fn run(self) {
        let Scheduler {
            tracker,
            period,
            mut trigger_rx,
            mut shutdown_rx,
        } = self;

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_secs = period.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown_rx) => break,
                _ = ticker.tick() => debug!("scheduled cycle"),
                Some(()) = trigger_rx.recv() => debug!("triggered cycle"),
            }

            match tracker.run_cycle_until(shutdown_requested(&mut shutdown_rx)).await {
                Ok(_) => {}
                Err(TrackerError::Cancelled) => {
                    info!("shutdown during fetch, cycle cancelled");
                    break;
                }
                Err(err) => debug!(transient = err.is_transient(), "cycle ended with error"),
            }
        }

        info!("scheduler stopped");
    }
}

/// Resolves once shutdown is signalled or the handle is dropped.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_signal_resolves() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        shutdown_requested(&mut rx).await;
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        shutdown_requested(&mut rx).await;
    }
}
