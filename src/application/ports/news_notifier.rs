use crate::domain::entities::NewsResource;
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Surfaces newly added news resources to the user.
#[async_trait]
pub trait NewsNotifier: Send + Sync {
    async fn post_news_notifications(&self, resources: &[NewsResource]) -> Result<(), AppError>;
}
