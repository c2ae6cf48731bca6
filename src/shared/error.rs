use crate::domain::value_objects::SyncCollection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote protocol error: {0}")]
    RemoteProtocol(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Sync already in progress for {0}")]
    ConcurrentSyncInProgress(SyncCollection),

    #[error("Sync cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Outcome classification carried by a failed [`SyncResult`](crate::domain::entities::SyncResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorKind {
    RemoteUnavailable,
    RemoteProtocol,
    Storage,
    ConcurrentSyncInProgress,
    Cancelled,
    Internal,
}

impl SyncErrorKind {
    /// Retrying the whole pass later can succeed without any other change.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RemoteUnavailable | Self::Storage)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RemoteUnavailable => "remote_unavailable",
            Self::RemoteProtocol => "remote_protocol",
            Self::Storage => "storage",
            Self::ConcurrentSyncInProgress => "concurrent_sync_in_progress",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl AppError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            AppError::RemoteUnavailable(_) => SyncErrorKind::RemoteUnavailable,
            AppError::RemoteProtocol(_) => SyncErrorKind::RemoteProtocol,
            AppError::Storage(_) => SyncErrorKind::Storage,
            AppError::ConcurrentSyncInProgress(_) => SyncErrorKind::ConcurrentSyncInProgress,
            AppError::Cancelled => SyncErrorKind::Cancelled,
            AppError::Configuration(_) | AppError::Internal(_) => SyncErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::RemoteProtocol(err.to_string())
    }
}
