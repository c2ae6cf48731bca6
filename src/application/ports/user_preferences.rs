use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait UserPreferences: Send + Sync {
    async fn followed_topic_ids(&self) -> Result<HashSet<String>, AppError>;
    async fn set_news_resources_viewed(
        &self,
        ids: &[String],
        viewed: bool,
    ) -> Result<(), AppError>;
}
