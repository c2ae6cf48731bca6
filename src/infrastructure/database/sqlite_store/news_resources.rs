use super::SqliteSyncStore;
use super::queries::{
    DELETE_NEWS_RESOURCE, DELETE_TOPIC_REFS_BY_NEWS_RESOURCE, INSERT_OR_IGNORE_TOPIC,
    INSERT_OR_IGNORE_TOPIC_REF, SELECT_NEWS_RESOURCE_BY_ID, SELECT_TOPIC_IDS_FOR_NEWS_RESOURCE,
    UPSERT_NEWS_RESOURCE,
};
use super::rows::{NewsResourceRow, map_news_resource_row};
use crate::domain::entities::{NewsResource, NewsResourceBatch, NewsResourceIdFilter};
use crate::shared::error::AppError;
use sqlx::{QueryBuilder, Row, Sqlite};
use std::collections::HashSet;

/// Upper bound on ids bound into a single `IN (...)` list.
const MAX_BOUND_IDS: usize = 500;

impl SqliteSyncStore {
    /// Topic shells, resources and cross references are written in one
    /// transaction so a reader never sees a reference without its target.
    pub(super) async fn write_news_batch(&self, batch: &NewsResourceBatch) -> Result<(), AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        for topic in &batch.topic_shells {
            sqlx::query(INSERT_OR_IGNORE_TOPIC)
                .bind(&topic.id)
                .bind(&topic.name)
                .bind(&topic.short_description)
                .bind(&topic.long_description)
                .bind(&topic.url)
                .bind(&topic.image_url)
                .execute(&mut *tx)
                .await?;
        }

        for resource in &batch.resources {
            sqlx::query(UPSERT_NEWS_RESOURCE)
                .bind(&resource.id)
                .bind(&resource.title)
                .bind(&resource.content)
                .bind(&resource.url)
                .bind(&resource.header_image_url)
                // Millisecond resolution, matching the INTEGER column.
                .bind(resource.publish_date.timestamp_millis())
                .bind(&resource.resource_type)
                .execute(&mut *tx)
                .await?;

            // Topic membership may shrink between versions.
            sqlx::query(DELETE_TOPIC_REFS_BY_NEWS_RESOURCE)
                .bind(&resource.id)
                .execute(&mut *tx)
                .await?;
        }

        for topic_ref in &batch.topic_refs {
            sqlx::query(INSERT_OR_IGNORE_TOPIC_REF)
                .bind(&topic_ref.news_resource_id)
                .bind(&topic_ref.topic_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub(super) async fn delete_news_resource_rows(&self, ids: &[String]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.get_pool().begin().await?;
        for id in ids {
            sqlx::query(DELETE_TOPIC_REFS_BY_NEWS_RESOURCE)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(DELETE_NEWS_RESOURCE)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub(super) async fn select_news_resource_ids(
        &self,
        filter: &NewsResourceIdFilter,
    ) -> Result<HashSet<String>, AppError> {
        let topic_ids: Option<Vec<&String>> =
            filter.topic_ids.as_ref().map(|ids| ids.iter().collect());
        if matches!(&topic_ids, Some(ids) if ids.is_empty()) {
            return Ok(HashSet::new());
        }

        let mut found = HashSet::new();
        match &filter.news_ids {
            Some(news_ids) => {
                let news_ids: Vec<&String> = news_ids.iter().collect();
                for chunk in news_ids.chunks(MAX_BOUND_IDS) {
                    let ids = self
                        .select_news_resource_ids_page(topic_ids.as_deref(), Some(chunk))
                        .await?;
                    found.extend(ids);
                }
            }
            None => {
                let ids = self
                    .select_news_resource_ids_page(topic_ids.as_deref(), None)
                    .await?;
                found.extend(ids);
            }
        }

        Ok(found)
    }

    async fn select_news_resource_ids_page(
        &self,
        topic_ids: Option<&[&String]>,
        news_ids: Option<&[&String]>,
    ) -> Result<Vec<String>, AppError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT DISTINCT nr.id AS id FROM news_resources nr");

        if topic_ids.is_some() {
            builder.push(" INNER JOIN news_resources_topics nrt ON nrt.news_resource_id = nr.id");
        }
        builder.push(" WHERE 1 = 1");

        if let Some(ids) = news_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            builder.push(" AND nr.id IN (");
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind((*id).clone());
            }
            separated.push_unseparated(")");
        }

        if let Some(ids) = topic_ids {
            builder.push(" AND nrt.topic_id IN (");
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind((*id).clone());
            }
            separated.push_unseparated(")");
        }

        let rows = builder.build().fetch_all(self.pool.get_pool()).await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(row.try_get::<String, _>("id")?);
        }
        Ok(ids)
    }

    /// Loads stored resources in the order of `ids`, skipping unknown ids.
    pub(super) async fn select_news_resources(
        &self,
        ids: &[String],
    ) -> Result<Vec<NewsResource>, AppError> {
        let mut resources = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query_as::<_, NewsResourceRow>(SELECT_NEWS_RESOURCE_BY_ID)
                .bind(id)
                .fetch_optional(self.pool.get_pool())
                .await?;
            let Some(row) = row else {
                continue;
            };

            let topic_rows = sqlx::query(SELECT_TOPIC_IDS_FOR_NEWS_RESOURCE)
                .bind(id)
                .fetch_all(self.pool.get_pool())
                .await?;
            let mut topic_ids = Vec::with_capacity(topic_rows.len());
            for topic_row in topic_rows {
                topic_ids.push(topic_row.try_get::<String, _>("topic_id")?);
            }

            resources.push(map_news_resource_row(row, topic_ids)?);
        }
        Ok(resources)
    }
}
