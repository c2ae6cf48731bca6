use crate::domain::entities::{NewsResource, Topic};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Fetches full payloads for a bounded list of ids. Ids that no longer exist
/// remotely are simply absent from the response.
#[async_trait]
pub trait BatchFetcher: Send + Sync {
    async fn fetch_topics(&self, ids: &[String]) -> Result<Vec<Topic>, AppError>;
    async fn fetch_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, AppError>;
}
