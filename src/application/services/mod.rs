pub mod sync_engine;
pub mod synchronizer;

pub use sync_engine::{SyncEngine, plan_chunks};
pub use synchronizer::{SyncStatus, SyncStatusMonitor, Synchronizer};
