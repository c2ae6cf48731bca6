use crate::domain::entities::{NewsResource, NewsResourceBatch, NewsResourceIdFilter, Topic};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashSet;

/// The local dataset readers observe. Every write is idempotent.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn upsert_topics(&self, topics: &[Topic]) -> Result<(), AppError>;
    async fn delete_topics(&self, ids: &[String]) -> Result<(), AppError>;
    async fn query_topic_ids(&self) -> Result<HashSet<String>, AppError>;

    /// Applies topic shells, resources and cross references in that order,
    /// atomically.
    async fn apply_news_batch(&self, batch: &NewsResourceBatch) -> Result<(), AppError>;
    async fn delete_news_resources(&self, ids: &[String]) -> Result<(), AppError>;
    async fn query_news_resource_ids(
        &self,
        filter: &NewsResourceIdFilter,
    ) -> Result<HashSet<String>, AppError>;
    async fn get_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, AppError>;
}
