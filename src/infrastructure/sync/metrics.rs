use crate::domain::entities::SyncStats;
use crate::domain::value_objects::SyncCollection;
use crate::shared::error::SyncErrorKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

const UNSET_TS: u64 = 0;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSyncMetricsSnapshot {
    pub collection: SyncCollection,
    pub total_success: u64,
    pub total_failure: u64,
    pub total_rejected: u64,
    pub consecutive_failure: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_error: Option<SyncErrorKind>,
    pub last_fetched_count: Option<u32>,
    pub last_deleted_count: Option<u32>,
    pub last_chunk_count: Option<u32>,
}

#[derive(Debug, Default, Clone)]
struct LastPassMetadata {
    error: Option<SyncErrorKind>,
    stats: Option<SyncStats>,
}

struct CollectionSyncMetrics {
    success: AtomicU64,
    failure: AtomicU64,
    rejected: AtomicU64,
    consecutive_failure: AtomicU64,
    last_success_ms: AtomicU64,
    last_failure_ms: AtomicU64,
    metadata: Mutex<LastPassMetadata>,
}

impl CollectionSyncMetrics {
    fn new() -> Self {
        Self {
            success: AtomicU64::new(0),
            failure: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            consecutive_failure: AtomicU64::new(0),
            last_success_ms: AtomicU64::new(UNSET_TS),
            last_failure_ms: AtomicU64::new(UNSET_TS),
            metadata: Mutex::new(LastPassMetadata::default()),
        }
    }

    fn record(&self, error: Option<SyncErrorKind>, stats: SyncStats) {
        let now = current_unix_ms();
        match error {
            None => {
                self.success.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failure.store(0, Ordering::Relaxed);
                self.last_success_ms.store(now, Ordering::Relaxed);
            }
            Some(_) => {
                self.failure.fetch_add(1, Ordering::Relaxed);
                self.consecutive_failure.fetch_add(1, Ordering::Relaxed);
                self.last_failure_ms.store(now, Ordering::Relaxed);
            }
        }

        if let Ok(mut guard) = self.metadata.lock() {
            guard.error = error;
            guard.stats = Some(stats);
        }
    }

    fn snapshot(&self, collection: SyncCollection) -> CollectionSyncMetricsSnapshot {
        let metadata = self
            .metadata
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        CollectionSyncMetricsSnapshot {
            collection,
            total_success: self.success.load(Ordering::Relaxed),
            total_failure: self.failure.load(Ordering::Relaxed),
            total_rejected: self.rejected.load(Ordering::Relaxed),
            consecutive_failure: self.consecutive_failure.load(Ordering::Relaxed),
            last_success_ms: timestamp_to_option(self.last_success_ms.load(Ordering::Relaxed)),
            last_failure_ms: timestamp_to_option(self.last_failure_ms.load(Ordering::Relaxed)),
            last_error: metadata.error,
            last_fetched_count: metadata.stats.map(|stats| stats.fetched_count),
            last_deleted_count: metadata.stats.map(|stats| stats.deleted_count),
            last_chunk_count: metadata.stats.map(|stats| stats.chunk_count),
        }
    }
}

fn current_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(UNSET_TS)
}

fn timestamp_to_option(value: u64) -> Option<u64> {
    if value == UNSET_TS { None } else { Some(value) }
}

struct SyncMetricsRegistry {
    topics: CollectionSyncMetrics,
    news_resources: CollectionSyncMetrics,
}

impl SyncMetricsRegistry {
    fn new() -> Self {
        Self {
            topics: CollectionSyncMetrics::new(),
            news_resources: CollectionSyncMetrics::new(),
        }
    }

    fn for_collection(&self, collection: SyncCollection) -> &CollectionSyncMetrics {
        match collection {
            SyncCollection::Topics => &self.topics,
            SyncCollection::NewsResources => &self.news_resources,
        }
    }
}

static SYNC_METRICS: LazyLock<SyncMetricsRegistry> = LazyLock::new(SyncMetricsRegistry::new);

pub fn record_success(collection: SyncCollection, stats: SyncStats) {
    SYNC_METRICS.for_collection(collection).record(None, stats);
}

pub fn record_failure(collection: SyncCollection, kind: SyncErrorKind, stats: SyncStats) {
    SYNC_METRICS
        .for_collection(collection)
        .record(Some(kind), stats);
}

/// Rejected passes never touched any state, so they do not count as failures.
pub fn record_rejected(collection: SyncCollection) {
    SYNC_METRICS
        .for_collection(collection)
        .rejected
        .fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot(collection: SyncCollection) -> CollectionSyncMetricsSnapshot {
    SYNC_METRICS.for_collection(collection).snapshot(collection)
}

pub fn snapshot_all() -> Vec<CollectionSyncMetricsSnapshot> {
    SyncCollection::ALL.into_iter().map(snapshot).collect()
}
