use crate::domain::value_objects::{ChangeListVersion, SyncCollection};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Durable per-collection change list watermark.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Returns [`ChangeListVersion::NEVER_SYNCED`] for a collection with no row.
    async fn read(&self, collection: SyncCollection) -> Result<ChangeListVersion, AppError>;
    async fn write(
        &self,
        collection: SyncCollection,
        version: ChangeListVersion,
    ) -> Result<(), AppError>;
}
