use crate::domain::entities::{NewsResource, Topic};
use crate::shared::error::AppError;
use chrono::DateTime;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub(super) struct TopicRow {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub url: String,
    pub image_url: String,
}

#[derive(Debug, Clone, FromRow)]
pub(super) struct NewsResourceRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub header_image_url: Option<String>,
    pub publish_date: i64,
    pub resource_type: String,
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Topic {
            id: row.id,
            name: row.name,
            short_description: row.short_description,
            long_description: row.long_description,
            url: row.url,
            image_url: row.image_url,
        }
    }
}

pub(super) fn map_news_resource_row(
    row: NewsResourceRow,
    topic_ids: Vec<String>,
) -> Result<NewsResource, AppError> {
    let publish_date = DateTime::from_timestamp_millis(row.publish_date).ok_or_else(|| {
        AppError::Storage(format!(
            "Invalid publish_date {} for news resource {}",
            row.publish_date, row.id
        ))
    })?;

    Ok(NewsResource {
        id: row.id,
        title: row.title,
        content: row.content,
        url: row.url,
        header_image_url: row.header_image_url,
        publish_date,
        resource_type: row.resource_type,
        topic_ids,
    })
}
