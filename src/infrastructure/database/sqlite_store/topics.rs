use super::SqliteSyncStore;
use super::queries::{
    DELETE_FOLLOWED_TOPIC, DELETE_TOPIC, DELETE_TOPIC_REFS_BY_TOPIC, SELECT_TOPIC_BY_ID,
    SELECT_TOPIC_IDS, UPSERT_TOPIC,
};
use super::rows::TopicRow;
use crate::domain::entities::Topic;
use crate::shared::error::AppError;
use sqlx::Row;
use std::collections::HashSet;

impl SqliteSyncStore {
    pub(super) async fn upsert_topic_rows(&self, topics: &[Topic]) -> Result<(), AppError> {
        if topics.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.get_pool().begin().await?;
        for topic in topics {
            sqlx::query(UPSERT_TOPIC)
                .bind(&topic.id)
                .bind(&topic.name)
                .bind(&topic.short_description)
                .bind(&topic.long_description)
                .bind(&topic.url)
                .bind(&topic.image_url)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Removes the topics together with every cross reference and follow row
    /// pointing at them.
    pub(super) async fn delete_topic_rows(&self, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.get_pool().begin().await?;
        for id in ids {
            sqlx::query(DELETE_TOPIC_REFS_BY_TOPIC)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(DELETE_FOLLOWED_TOPIC)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(DELETE_TOPIC)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub(super) async fn select_topic_ids(&self) -> Result<HashSet<String>, AppError> {
        let rows = sqlx::query(SELECT_TOPIC_IDS)
            .fetch_all(self.pool.get_pool())
            .await?;

        let mut ids = HashSet::with_capacity(rows.len());
        for row in rows {
            ids.insert(row.try_get::<String, _>("id")?);
        }
        Ok(ids)
    }

    pub async fn get_topic(&self, id: &str) -> Result<Option<Topic>, AppError> {
        let row = sqlx::query_as::<_, TopicRow>(SELECT_TOPIC_BY_ID)
            .bind(id)
            .fetch_optional(self.pool.get_pool())
            .await?;

        Ok(row.map(Topic::from))
    }
}
