use crate::application::ports::NewsNotifier;
use crate::domain::entities::NewsResource;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Notifier that only logs. Also queues the ids it was asked to surface so a
/// host without a notification channel can poll them; polling drains the
/// queue.
#[derive(Debug, Default)]
pub struct TracingNewsNotifier {
    posted: Mutex<Vec<String>>,
}

impl TracingNewsNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_posted_ids(&self) -> Vec<String> {
        self.posted
            .lock()
            .map(|mut posted| std::mem::take(&mut *posted))
            .unwrap_or_default()
    }
}

#[async_trait]
impl NewsNotifier for TracingNewsNotifier {
    async fn post_news_notifications(&self, resources: &[NewsResource]) -> Result<(), AppError> {
        if resources.is_empty() {
            return Ok(());
        }

        for resource in resources {
            tracing::info!(
                target: "sync::notify",
                news_resource_id = %resource.id,
                title = %resource.title,
                "new news resource"
            );
        }

        let mut posted = self
            .posted
            .lock()
            .map_err(|_| AppError::Internal("notifier state poisoned".to_string()))?;
        posted.extend(resources.iter().map(|resource| resource.id.clone()));
        Ok(())
    }
}
