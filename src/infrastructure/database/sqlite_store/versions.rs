use super::SqliteSyncStore;
use super::queries::{SELECT_VERSION, UPSERT_VERSION};
use crate::application::ports::VersionStore;
use crate::domain::value_objects::{ChangeListVersion, SyncCollection};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

#[async_trait]
impl VersionStore for SqliteSyncStore {
    async fn read(&self, collection: SyncCollection) -> Result<ChangeListVersion, AppError> {
        let row = sqlx::query(SELECT_VERSION)
            .bind(collection.as_str())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(ChangeListVersion::new(row.try_get::<i64, _>("version")?)),
            None => Ok(ChangeListVersion::NEVER_SYNCED),
        }
    }

    async fn write(
        &self,
        collection: SyncCollection,
        version: ChangeListVersion,
    ) -> Result<(), AppError> {
        sqlx::query(UPSERT_VERSION)
            .bind(collection.as_str())
            .bind(version.value())
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;

        Ok(())
    }
}
