use super::ConnectionPool;
use crate::application::ports::LocalStore;
use crate::domain::entities::{NewsResource, NewsResourceBatch, NewsResourceIdFilter, Topic};
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashSet;

mod news_resources;
mod preferences;
mod queries;
mod rows;
mod topics;
mod versions;

/// SQLite-backed local dataset, watermark store and sync-related preferences.
#[derive(Clone)]
pub struct SqliteSyncStore {
    pool: ConnectionPool,
}

impl SqliteSyncStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub async fn initialize(&self) -> Result<(), AppError> {
        self.pool.migrate().await?;
        Ok(())
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

#[async_trait]
impl LocalStore for SqliteSyncStore {
    async fn upsert_topics(&self, topics: &[Topic]) -> Result<(), AppError> {
        self.upsert_topic_rows(topics).await
    }

    async fn delete_topics(&self, ids: &[String]) -> Result<(), AppError> {
        self.delete_topic_rows(ids).await
    }

    async fn query_topic_ids(&self) -> Result<HashSet<String>, AppError> {
        self.select_topic_ids().await
    }

    async fn apply_news_batch(&self, batch: &NewsResourceBatch) -> Result<(), AppError> {
        self.write_news_batch(batch).await
    }

    async fn delete_news_resources(&self, ids: &[String]) -> Result<(), AppError> {
        self.delete_news_resource_rows(ids).await
    }

    async fn query_news_resource_ids(
        &self,
        filter: &NewsResourceIdFilter,
    ) -> Result<HashSet<String>, AppError> {
        self.select_news_resource_ids(filter).await
    }

    async fn get_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, AppError> {
        self.select_news_resources(ids).await
    }
}
