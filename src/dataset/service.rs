//! Dataset loading service
//!
//! Owns the current [`Snapshot`] and replaces it wholesale on every load. The three datasets
//! are fetched and decoded concurrently; a failure in one is reported and degrades that
//! dataset to empty without affecting the others.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use super::decoder::decode_ndjson_gz;
use super::source::DatasetSource;
use crate::models::{ActivityRecord, CampaignRecord, Dimension, MonthlyRecord};
use crate::pipeline::dimensions::distinct_values;

pub const ALL_FAILED_MESSAGE: &str =
    "Failed to load all datasets; the dashboard may not function correctly";

/// Receives human-readable dataset failure messages
pub trait FailureReporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Reports failures through the tracing subscriber
pub struct LogReporter;

impl FailureReporter for LogReporter {
    fn report(&self, message: &str) {
        error!("{message}");
    }
}

/// Asset paths of the three datasets, relative to the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub campaign: String,
    pub activity: String,
    pub monthly: String,
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            campaign: "data/camp_user.json.gz".to_string(),
            activity: "data/act.json.gz".to_string(),
            monthly: "data/monthly_metrics.json.gz".to_string(),
        }
    }
}

/// Immutable result of one load cycle
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// 0 until the first load completes
    pub generation: u64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub campaign: Vec<CampaignRecord>,
    pub activity: Vec<ActivityRecord>,
    pub monthly: Vec<MonthlyRecord>,
    pub distinct_products: Vec<String>,
    pub distinct_projects: Vec<String>,
    /// Failure messages reported during the cycle that produced this snapshot
    pub failures: Vec<String>,
}

impl Snapshot {
    /// Build a snapshot from decoded collections, deriving the selector options
    pub fn from_collections(
        campaign: Vec<CampaignRecord>,
        activity: Vec<ActivityRecord>,
        monthly: Vec<MonthlyRecord>,
    ) -> Self {
        let distinct_products = distinct_values(&campaign, Dimension::Product);
        let distinct_projects = distinct_values(&campaign, Dimension::Project);

        Self {
            generation: 0,
            loaded_at: None,
            campaign,
            activity,
            monthly,
            distinct_products,
            distinct_projects,
            failures: Vec::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }
}

pub struct DataService {
    source: Arc<dyn DatasetSource>,
    paths: DatasetPaths,
    reporter: Arc<dyn FailureReporter>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    generation: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
}

impl DataService {
    pub fn new(
        source: Arc<dyn DatasetSource>,
        paths: DatasetPaths,
        reporter: Arc<dyn FailureReporter>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::default()));
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            source,
            paths,
            reporter,
            snapshot_tx,
            generation: AtomicU64::new(0),
            shutdown_tx,
        }
    }

    /// Current snapshot; cheap to clone and safe to hold across reloads
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot_tx.borrow())
    }

    /// Notified each time a new snapshot is installed
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    pub fn paths(&self) -> &DatasetPaths {
        &self.paths
    }

    /// Fetch and decode all three datasets, then install the result as one unit.
    ///
    /// Never fails: broken datasets are reported and come back empty.
    pub async fn load(&self) -> Arc<Snapshot> {
        info!(source = %self.source.describe(), "loading datasets");

        let (campaign, activity, monthly) = tokio::join!(
            self.load_dataset::<CampaignRecord>(&self.paths.campaign),
            self.load_dataset::<ActivityRecord>(&self.paths.activity),
            self.load_dataset::<MonthlyRecord>(&self.paths.monthly),
        );

        let mut failures = Vec::new();
        let campaign = self.settle(campaign, &mut failures);
        let activity = self.settle(activity, &mut failures);
        let monthly = self.settle(monthly, &mut failures);

        if failures.len() == 3 {
            self.reporter.report(ALL_FAILED_MESSAGE);
            failures.push(ALL_FAILED_MESSAGE.to_string());
        }

        let mut snapshot = Snapshot::from_collections(campaign, activity, monthly);
        snapshot.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        snapshot.loaded_at = Some(Utc::now());
        snapshot.failures = failures;

        info!(
            generation = snapshot.generation,
            campaign = snapshot.campaign.len(),
            activity = snapshot.activity.len(),
            monthly = snapshot.monthly.len(),
            "datasets loaded"
        );

        let snapshot = Arc::new(snapshot);
        if !self.install(Arc::clone(&snapshot)) {
            debug!(
                generation = snapshot.generation,
                "newer snapshot already installed, discarding"
            );
        }
        snapshot
    }

    /// Install `snapshot` unless a newer generation is already current
    fn install(&self, snapshot: Arc<Snapshot>) -> bool {
        self.snapshot_tx.send_if_modified(|current| {
            if current.generation < snapshot.generation {
                *current = snapshot;
                true
            } else {
                false
            }
        })
    }

    async fn load_dataset<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, String> {
        let result = match self.source.fetch(path).await {
            Ok(bytes) => decode_ndjson_gz::<T>(&bytes),
            Err(e) => Err(e),
        };

        match result {
            Ok(decoded) => {
                if decoded.skipped > 0 {
                    warn!(path, skipped = decoded.skipped, "skipped malformed records");
                }
                Ok(decoded.records)
            }
            Err(e) => Err(format!("Error loading data from {path}: {e}")),
        }
    }

    fn settle<T>(&self, result: Result<Vec<T>, String>, failures: &mut Vec<String>) -> Vec<T> {
        match result {
            Ok(records) => records,
            Err(message) => {
                self.reporter.report(&message);
                failures.push(message);
                Vec::new()
            }
        }
    }

    /// Reload every `interval` until [`DataService::shutdown`] is called
    pub fn spawn_refresh(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The first tick fires immediately; the initial load is done by the caller
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        service.load().await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            info!("Dataset refresh task shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Stop the refresh task, if one is running
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
