use super::SqliteSyncStore;
use super::queries::{
    DELETE_FOLLOWED_TOPIC, DELETE_VIEWED_NEWS_RESOURCE, INSERT_FOLLOWED_TOPIC,
    INSERT_VIEWED_NEWS_RESOURCE, SELECT_FOLLOWED_TOPIC_IDS, SELECT_VIEWED_NEWS_RESOURCE,
};
use crate::application::ports::UserPreferences;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::collections::HashSet;

impl SqliteSyncStore {
    pub async fn follow_topic(&self, topic_id: &str) -> Result<(), AppError> {
        sqlx::query(INSERT_FOLLOWED_TOPIC)
            .bind(topic_id)
            .bind(Utc::now().timestamp_millis())
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    pub async fn unfollow_topic(&self, topic_id: &str) -> Result<(), AppError> {
        sqlx::query(DELETE_FOLLOWED_TOPIC)
            .bind(topic_id)
            .execute(self.pool.get_pool())
            .await?;
        Ok(())
    }

    pub async fn is_news_resource_viewed(&self, id: &str) -> Result<bool, AppError> {
        let row = sqlx::query(SELECT_VIEWED_NEWS_RESOURCE)
            .bind(id)
            .fetch_optional(self.pool.get_pool())
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl UserPreferences for SqliteSyncStore {
    async fn followed_topic_ids(&self) -> Result<HashSet<String>, AppError> {
        let rows = sqlx::query(SELECT_FOLLOWED_TOPIC_IDS)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(row.try_get::<String, _>("topic_id")?);
        }
        Ok(ids)
    }

    async fn set_news_resources_viewed(
        &self,
        ids: &[String],
        viewed: bool,
    ) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        let now = Utc::now().timestamp_millis();
        let mut tx = self.pool.get_pool().begin().await?;
        for id in ids {
            if viewed {
                sqlx::query(INSERT_VIEWED_NEWS_RESOURCE)
                    .bind(id)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            } else {
                sqlx::query(DELETE_VIEWED_NEWS_RESOURCE)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }
}
