use crate::domain::entities::ChangeList;
use crate::domain::value_objects::{ChangeListVersion, SyncCollection};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
pub trait ChangeListSource: Send + Sync {
    async fn change_list(
        &self,
        collection: SyncCollection,
        since: ChangeListVersion,
    ) -> Result<ChangeList, AppError>;
}
