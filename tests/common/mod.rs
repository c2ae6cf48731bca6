use std::sync::Arc;

use chrono::{TimeZone, Utc};
use feed_sync::{
    ConnectionPool, InMemoryRemoteSource, NewsResource, SqliteSyncStore, SyncEngine, Topic,
};

#[allow(dead_code)]
pub const FEED_FIXTURE: &str = include_str!("fixtures/feed.json");

pub struct SyncTestContext {
    pub engine: Arc<SyncEngine>,
    pub store: SqliteSyncStore,
    pub remote: Arc<InMemoryRemoteSource>,
}

pub async fn setup_store(database_url: &str) -> SqliteSyncStore {
    let pool = ConnectionPool::new(database_url, 1)
        .await
        .expect("sqlite pool");
    let store = SqliteSyncStore::new(pool);
    store.initialize().await.expect("migrations");
    store
}

pub fn build_engine(store: &SqliteSyncStore, remote: &Arc<InMemoryRemoteSource>) -> SyncEngine {
    let local = Arc::new(store.clone());
    SyncEngine::new(
        local.clone(),
        remote.clone(),
        remote.clone(),
        local.clone(),
        local,
    )
}

pub async fn setup_sync_context() -> SyncTestContext {
    let store = setup_store("sqlite::memory:").await;
    let remote = Arc::new(InMemoryRemoteSource::new());
    let engine = Arc::new(build_engine(&store, &remote));

    SyncTestContext {
        engine,
        store,
        remote,
    }
}

#[allow(dead_code)]
pub fn sample_topics(count: usize) -> Vec<Topic> {
    (0..count)
        .map(|index| Topic::new(format!("topic-{index}"), format!("Topic {index}")))
        .collect()
}

pub fn sample_news(id: &str, topic_ids: &[&str]) -> NewsResource {
    NewsResource {
        id: id.to_string(),
        title: format!("Headline {id}"),
        content: format!("Body of {id}"),
        url: format!("https://example.com/news/{id}"),
        header_image_url: Some(format!("https://example.com/img/{id}.png")),
        publish_date: Utc.with_ymd_and_hms(2024, 6, 1, 7, 30, 0).unwrap(),
        resource_type: "article".to_string(),
        topic_ids: topic_ids.iter().map(|id| id.to_string()).collect(),
    }
}

#[allow(dead_code)]
pub fn sample_news_batch(count: usize, topic_id: &str) -> Vec<NewsResource> {
    (0..count)
        .map(|index| sample_news(&format!("news-{index}"), &[topic_id]))
        .collect()
}
