pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{
    BatchFetcher, ChangeListSource, LocalStore, NewsNotifier, UserPreferences, VersionStore,
};
pub use application::services::{
    SyncEngine, SyncStatus, SyncStatusMonitor, Synchronizer, plan_chunks,
};
pub use domain::entities::{
    ChangeList, ChangeListEntry, NewsResource, SyncReport, SyncResult, SyncStats, Topic,
};
pub use domain::value_objects::{ChangeListVersion, SyncCollection};
pub use infrastructure::{
    ConnectionPool, InMemoryRemoteSource, SqliteSyncStore, TracingNewsNotifier,
};
pub use infrastructure::sync::metrics as sync_metrics;
pub use shared::{AppConfig, AppError, SyncErrorKind};

/// Installs the global subscriber. `RUST_LOG` overrides the default filter;
/// calling this more than once is harmless.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
