//! Shared fakes for the tracker integration tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hazard_core::dispatch::fakes::MemoryConsumer;
use hazard_core::{
    FeedPath, FetchError, GeoPoint, Hazard, HazardFetcher, HazardStateStore, HazardTracker,
    MemoryStateStore, StaticLocations, TrackerConfig,
};

pub const KM_PER_DEGREE: f64 = 111.194_926_644_558_73;

pub const HOME: GeoPoint = GeoPoint {
    latitude: -33.8688,
    longitude: 151.2093,
};

pub fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint::new(origin.latitude + km / KM_PER_DEGREE, origin.longitude)
}

pub fn hazard_at(id: &str, category: &str, at: GeoPoint) -> Hazard {
    Hazard::new(id, "Crash on Parramatta Rd", category, at.latitude, at.longitude)
}

/// Fetcher returning whatever it was last told to, optionally after a delay.
#[derive(Default)]
pub struct ScriptedFetcher {
    response: Mutex<Option<Result<Vec<Hazard>, FetchError>>>,
    delay: Mutex<Option<Duration>>,
    started: AtomicUsize,
    finished: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_paths: Mutex<BTreeSet<FeedPath>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, response: Result<Vec<Hazard>, FetchError>) {
        *self.response.lock().unwrap() = Some(response);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_paths(&self) -> BTreeSet<FeedPath> {
        self.last_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl HazardFetcher for ScriptedFetcher {
    async fn fetch(&self, paths: &BTreeSet<FeedPath>) -> Result<Vec<Hazard>, FetchError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        *self.last_paths.lock().unwrap() = paths.clone();

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub struct Harness {
    pub tracker: Arc<HazardTracker>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub locations: Arc<StaticLocations>,
    pub store: Arc<dyn HazardStateStore>,
    pub consumer: Arc<MemoryConsumer>,
}

pub fn harness(config: TrackerConfig) -> Harness {
    harness_with_store(config, Arc::new(MemoryStateStore::new()))
}

pub fn harness_with_store(config: TrackerConfig, store: Arc<dyn HazardStateStore>) -> Harness {
    let fetcher = ScriptedFetcher::new();
    let locations = Arc::new(StaticLocations::from_config(&config));
    let consumer = Arc::new(MemoryConsumer::new());
    let tracker = HazardTracker::new(
        config,
        fetcher.clone(),
        locations.clone(),
        store.clone(),
        consumer.clone(),
    )
    .expect("valid config");

    Harness {
        tracker: Arc::new(tracker),
        fetcher,
        locations,
        store,
        consumer,
    }
}

/// Home at [`HOME`] with a 5 km radius, monitoring accidents and fires.
pub fn home_config() -> TrackerConfig {
    TrackerConfig::new(HOME.latitude, HOME.longitude)
        .with_home_radius(5.0)
        .with_monitored_categories(&["accident", "fire"])
}
