/// Maximum number of ids requested from the remote in a single batch.
pub const SYNC_BATCH_SIZE: usize = 40;

/// Watermark value for a collection that has never completed a pass.
pub const NEVER_SYNCED_VERSION: i64 = 0;
