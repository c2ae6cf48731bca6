use crate::domain::value_objects::{ChangeListVersion, SyncCollection};
use crate::shared::error::{AppError, SyncErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub deleted_count: u32,
    pub changed_count: u32,
    pub fetched_count: u32,
    pub chunk_count: u32,
    pub committed_chunks: u32,
}

/// Outcome of a single pass over one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub collection: SyncCollection,
    pub success: bool,
    pub first_sync: bool,
    pub new_version: Option<ChangeListVersion>,
    pub notify_ids: Vec<String>,
    pub error: Option<SyncErrorKind>,
    pub error_message: Option<String>,
    pub stats: SyncStats,
}

impl SyncResult {
    pub fn succeeded(
        collection: SyncCollection,
        first_sync: bool,
        new_version: ChangeListVersion,
        notify_ids: Vec<String>,
        stats: SyncStats,
    ) -> Self {
        Self {
            collection,
            success: true,
            first_sync,
            new_version: Some(new_version),
            notify_ids,
            error: None,
            error_message: None,
            stats,
        }
    }

    pub fn failed(
        collection: SyncCollection,
        first_sync: bool,
        kind: SyncErrorKind,
        message: impl Into<String>,
        stats: SyncStats,
    ) -> Self {
        Self {
            collection,
            success: false,
            first_sync,
            new_version: None,
            notify_ids: Vec::new(),
            error: Some(kind),
            error_message: Some(message.into()),
            stats,
        }
    }

    pub fn from_error(
        collection: SyncCollection,
        first_sync: bool,
        err: &AppError,
        stats: SyncStats,
    ) -> Self {
        Self::failed(collection, first_sync, err.kind(), err.to_string(), stats)
    }

    pub fn rejected(collection: SyncCollection) -> Self {
        Self::from_error(
            collection,
            false,
            &AppError::ConcurrentSyncInProgress(collection),
            SyncStats::default(),
        )
    }

    pub fn is_rejected(&self) -> bool {
        self.error == Some(SyncErrorKind::ConcurrentSyncInProgress)
    }

    pub fn is_retryable(&self) -> bool {
        self.error.map(SyncErrorKind::is_retryable).unwrap_or(false)
    }
}

/// Aggregate of one synchronizer round across every collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub results: Vec<SyncResult>,
    pub notified_count: u32,
    pub started_at_ms: i64,
    pub finished_at_ms: i64,
}

impl SyncReport {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|result| result.success)
    }

    /// True when some pass actually ran and failed. Passes rejected because
    /// another round owns the collection do not count.
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|result| !result.success && !result.is_rejected())
    }

    /// A round should be retried when some collection failed in a way that a
    /// later attempt can fix.
    pub fn needs_retry(&self) -> bool {
        self.results.iter().any(SyncResult::is_retryable)
    }

    pub fn result_for(&self, collection: SyncCollection) -> Option<&SyncResult> {
        self.results
            .iter()
            .find(|result| result.collection == collection)
    }
}
