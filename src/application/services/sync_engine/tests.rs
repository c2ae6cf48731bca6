use super::core::SyncEngine;
use crate::application::ports::{
    BatchFetcher, ChangeListSource, LocalStore, UserPreferences, VersionStore,
};
use crate::domain::entities::{
    ChangeList, ChangeListEntry, NewsResource, NewsResourceBatch, NewsResourceIdFilter, Topic,
};
use crate::domain::value_objects::{ChangeListVersion, SyncCollection};
use crate::infrastructure::remote::InMemoryRemoteSource;
use crate::shared::error::{AppError, SyncErrorKind};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mockall::mock;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct MemoryState {
    topics: HashMap<String, Topic>,
    news: HashMap<String, NewsResource>,
    versions: HashMap<SyncCollection, ChangeListVersion>,
    followed: HashSet<String>,
    viewed: HashSet<String>,
    ops: Vec<String>,
}

/// Local store, preferences and version store backed by plain maps. Records
/// every write so tests can assert on ordering.
#[derive(Debug, Default)]
struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    fn follow(&self, topic_id: &str) {
        self.state.lock().unwrap().followed.insert(topic_id.to_string());
    }

    fn seed_topic(&self, topic: Topic) {
        self.state
            .lock()
            .unwrap()
            .topics
            .insert(topic.id.clone(), topic);
    }

    fn seed_version(&self, collection: SyncCollection, version: i64) {
        self.state
            .lock()
            .unwrap()
            .versions
            .insert(collection, ChangeListVersion::new(version));
    }

    fn version(&self, collection: SyncCollection) -> ChangeListVersion {
        self.state
            .lock()
            .unwrap()
            .versions
            .get(&collection)
            .copied()
            .unwrap_or_default()
    }

    fn topic_ids(&self) -> HashSet<String> {
        self.state.lock().unwrap().topics.keys().cloned().collect()
    }

    fn news_ids(&self) -> HashSet<String> {
        self.state.lock().unwrap().news.keys().cloned().collect()
    }

    fn viewed(&self) -> HashSet<String> {
        self.state.lock().unwrap().viewed.clone()
    }

    fn ops(&self) -> Vec<String> {
        self.state.lock().unwrap().ops.clone()
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn upsert_topics(&self, topics: &[Topic]) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("upsert_topics:{}", topics.len()));
        for topic in topics {
            state.topics.insert(topic.id.clone(), topic.clone());
        }
        Ok(())
    }

    async fn delete_topics(&self, ids: &[String]) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("delete_topics:{}", ids.join(",")));
        for id in ids {
            state.topics.remove(id);
        }
        Ok(())
    }

    async fn query_topic_ids(&self) -> Result<HashSet<String>, AppError> {
        Ok(self.topic_ids())
    }

    async fn apply_news_batch(&self, batch: &NewsResourceBatch) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("apply_news_batch:{}", batch.resources.len()));
        for shell in &batch.topic_shells {
            state
                .topics
                .entry(shell.id.clone())
                .or_insert_with(|| shell.clone());
        }
        for resource in &batch.resources {
            state.news.insert(resource.id.clone(), resource.clone());
        }
        Ok(())
    }

    async fn delete_news_resources(&self, ids: &[String]) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("delete_news:{}", ids.join(",")));
        for id in ids {
            state.news.remove(id);
        }
        Ok(())
    }

    async fn query_news_resource_ids(
        &self,
        filter: &NewsResourceIdFilter,
    ) -> Result<HashSet<String>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .news
            .values()
            .filter(|resource| filter.matches(&resource.id, &resource.topic_ids))
            .map(|resource| resource.id.clone())
            .collect())
    }

    async fn get_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.news.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl UserPreferences for MemoryStore {
    async fn followed_topic_ids(&self) -> Result<HashSet<String>, AppError> {
        Ok(self.state.lock().unwrap().followed.clone())
    }

    async fn set_news_resources_viewed(
        &self,
        ids: &[String],
        viewed: bool,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(format!("set_viewed:{}", ids.len()));
        for id in ids {
            if viewed {
                state.viewed.insert(id.clone());
            } else {
                state.viewed.remove(id);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn read(&self, collection: SyncCollection) -> Result<ChangeListVersion, AppError> {
        Ok(self.version(collection))
    }

    async fn write(
        &self,
        collection: SyncCollection,
        version: ChangeListVersion,
    ) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state
            .ops
            .push(format!("write_version:{}:{}", collection, version.value()));
        state.versions.insert(collection, version);
        Ok(())
    }
}

mock! {
    pub Fetcher {}

    #[async_trait]
    impl BatchFetcher for Fetcher {
        async fn fetch_topics(&self, ids: &[String]) -> Result<Vec<Topic>, AppError>;
        async fn fetch_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, AppError>;
    }
}

mock! {
    pub ChangeLists {}

    #[async_trait]
    impl ChangeListSource for ChangeLists {
        async fn change_list(
            &self,
            collection: SyncCollection,
            since: ChangeListVersion,
        ) -> Result<ChangeList, AppError>;
    }
}

mock! {
    pub Versions {}

    #[async_trait]
    impl VersionStore for Versions {
        async fn read(&self, collection: SyncCollection) -> Result<ChangeListVersion, AppError>;
        async fn write(
            &self,
            collection: SyncCollection,
            version: ChangeListVersion,
        ) -> Result<(), AppError>;
    }
}

/// Topic fetcher that parks inside the first request until released.
#[derive(Default)]
struct GatedFetcher {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl BatchFetcher for GatedFetcher {
    async fn fetch_topics(&self, ids: &[String]) -> Result<Vec<Topic>, AppError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(ids.iter().map(|id| Topic::new(id.clone(), "gated")).collect())
    }

    async fn fetch_news_resources(&self, _ids: &[String]) -> Result<Vec<NewsResource>, AppError> {
        Ok(Vec::new())
    }
}

fn topics(count: usize) -> Vec<Topic> {
    (0..count)
        .map(|index| Topic::new(format!("t{index}"), format!("Topic {index}")))
        .collect()
}

fn news(id: &str, topic_ids: &[&str]) -> NewsResource {
    NewsResource {
        id: id.to_string(),
        title: format!("News {id}"),
        content: String::new(),
        url: format!("https://example.com/{id}"),
        header_image_url: None,
        publish_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        resource_type: "article".to_string(),
        topic_ids: topic_ids.iter().map(|id| id.to_string()).collect(),
    }
}

fn engine_with(remote: &Arc<InMemoryRemoteSource>, store: &Arc<MemoryStore>) -> SyncEngine {
    SyncEngine::new(
        store.clone(),
        remote.clone(),
        remote.clone(),
        store.clone(),
        store.clone(),
    )
}

#[tokio::test]
async fn test_first_topic_sync_splits_into_bounded_chunks() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(85)).await;
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(&remote, &store);

    let result = engine.run(SyncCollection::Topics).await;

    assert!(result.success);
    assert!(result.first_sync);
    assert_eq!(result.new_version, Some(ChangeListVersion::new(85)));
    assert!(result.notify_ids.is_empty());
    assert_eq!(result.stats.chunk_count, 3);
    assert_eq!(result.stats.committed_chunks, 3);
    assert_eq!(result.stats.fetched_count, 85);

    let sizes: Vec<usize> = remote
        .requested_batches()
        .await
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(sizes, vec![40, 40, 5]);
    assert_eq!(store.topic_ids().len(), 85);
    assert_eq!(store.version(SyncCollection::Topics), ChangeListVersion::new(85));
    assert_eq!(
        store.ops().last().map(String::as_str),
        Some("write_version:topics:85")
    );
}

#[tokio::test]
async fn test_custom_batch_size_is_honoured() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(7)).await;
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(&remote, &store).with_batch_size(NonZeroUsize::new(3).unwrap());

    let result = engine.run(SyncCollection::Topics).await;

    assert!(result.success);
    assert_eq!(result.stats.chunk_count, 3);
    assert_eq!(engine.batch_size().get(), 3);
}

#[tokio::test]
async fn test_first_news_sync_marks_everything_viewed_before_writing() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote
        .publish_news_resources(vec![news("n1", &["t1"]), news("n2", &["t1", "t2"])])
        .await;
    let store = Arc::new(MemoryStore::default());
    store.follow("t1");
    let engine = engine_with(&remote, &store);

    let result = engine.run(SyncCollection::NewsResources).await;

    assert!(result.success);
    assert!(result.first_sync);
    assert!(result.notify_ids.is_empty());
    assert_eq!(
        store.viewed(),
        HashSet::from(["n1".to_string(), "n2".to_string()])
    );
    assert_eq!(
        store.ops(),
        vec![
            "set_viewed:2".to_string(),
            "apply_news_batch:2".to_string(),
            "write_version:news_resources:2".to_string(),
        ]
    );
    // Referenced topics exist locally as shells.
    assert!(store.topic_ids().contains("t2"));
}

#[tokio::test]
async fn test_delete_wins_over_change_in_same_list() {
    let mut change_lists = MockChangeLists::new();
    change_lists
        .expect_change_list()
        .times(1)
        .returning(|_, _| {
            Ok(ChangeList::new(
                vec![
                    ChangeListEntry::changed("x", 100),
                    ChangeListEntry::deleted("x", 100),
                    ChangeListEntry::changed("y", 100),
                ],
                ChangeListVersion::new(100),
            ))
        });

    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch_topics()
        .times(1)
        .withf(|ids| ids.len() == 1 && ids[0] == "y")
        .returning(|ids| Ok(ids.iter().map(|id| Topic::new(id.clone(), "Y")).collect()));

    let store = Arc::new(MemoryStore::default());
    store.seed_topic(Topic::new("x", "X"));
    store.seed_version(SyncCollection::Topics, 99);

    let engine = SyncEngine::new(
        store.clone(),
        Arc::new(change_lists),
        Arc::new(fetcher),
        store.clone(),
        store.clone(),
    );

    let result = engine.run(SyncCollection::Topics).await;

    assert!(result.success);
    assert!(!result.first_sync);
    assert_eq!(result.new_version, Some(ChangeListVersion::new(100)));
    assert_eq!(store.topic_ids(), HashSet::from(["y".to_string()]));
    assert_eq!(store.ops()[0], "delete_topics:x");
}

#[tokio::test]
async fn test_all_ids_deleted_still_advances_watermark() {
    let mut change_lists = MockChangeLists::new();
    change_lists
        .expect_change_list()
        .withf(|collection, since| {
            *collection == SyncCollection::NewsResources && *since == ChangeListVersion::new(100)
        })
        .returning(|_, _| {
            Ok(ChangeList::new(
                vec![
                    ChangeListEntry::changed("a", 101),
                    ChangeListEntry::deleted("b", 102),
                    ChangeListEntry::deleted("a", 103),
                ],
                ChangeListVersion::new(103),
            ))
        });
    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch_news_resources().never();

    let store = Arc::new(MemoryStore::default());
    store.seed_version(SyncCollection::NewsResources, 100);
    store.follow("t1");
    let batch = NewsResourceBatch::from_resources(vec![news("a", &["t1"]), news("b", &["t1"])]);
    store.apply_news_batch(&batch).await.unwrap();

    let engine = SyncEngine::new(
        store.clone(),
        Arc::new(change_lists),
        Arc::new(fetcher),
        store.clone(),
        store.clone(),
    );

    let result = engine.run(SyncCollection::NewsResources).await;

    assert!(result.success);
    assert_eq!(result.new_version, Some(ChangeListVersion::new(103)));
    assert!(result.notify_ids.is_empty());
    assert_eq!(result.stats.chunk_count, 0);
    assert!(store.news_ids().is_empty());
}

#[tokio::test]
async fn test_failed_chunk_keeps_watermark_and_next_run_recovers() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(85)).await;
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(&remote, &store);

    remote.fail_batch_request(2);
    let failed = engine.run(SyncCollection::Topics).await;

    assert!(!failed.success);
    assert_eq!(failed.error, Some(SyncErrorKind::RemoteUnavailable));
    assert!(failed.is_retryable());
    assert_eq!(failed.new_version, None);
    assert_eq!(failed.stats.committed_chunks, 1);
    assert_eq!(store.version(SyncCollection::Topics), ChangeListVersion::NEVER_SYNCED);

    let retried = engine.run(SyncCollection::Topics).await;

    assert!(retried.success);
    assert!(retried.first_sync);
    assert_eq!(retried.new_version, Some(ChangeListVersion::new(85)));
    assert_eq!(store.topic_ids().len(), 85);
}

#[tokio::test]
async fn test_unreachable_remote_leaves_state_untouched() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(3)).await;
    remote.set_offline(true);
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(&remote, &store);

    let result = engine.run(SyncCollection::Topics).await;

    assert!(!result.success);
    assert_eq!(result.error, Some(SyncErrorKind::RemoteUnavailable));
    assert!(store.ops().is_empty());
    assert_eq!(remote.batch_request_count(), 0);
}

#[tokio::test]
async fn test_empty_change_list_is_a_successful_no_op() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    let store = Arc::new(MemoryStore::default());
    store.seed_version(SyncCollection::NewsResources, 12);
    let engine = engine_with(&remote, &store);

    let result = engine.run(SyncCollection::NewsResources).await;

    assert!(result.success);
    assert!(!result.first_sync);
    assert_eq!(result.new_version, Some(ChangeListVersion::new(12)));
    assert_eq!(result.stats.chunk_count, 0);
    assert_eq!(remote.batch_request_count(), 0);
}

#[tokio::test]
async fn test_concurrent_pass_for_same_collection_is_rejected() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(2)).await;
    let store = Arc::new(MemoryStore::default());
    let fetcher = Arc::new(GatedFetcher::default());
    let engine = Arc::new(SyncEngine::new(
        store.clone(),
        remote.clone(),
        fetcher.clone(),
        store.clone(),
        store.clone(),
    ));

    let running = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.run(SyncCollection::Topics).await })
    };
    fetcher.entered.notified().await;

    assert!(engine.is_syncing(SyncCollection::Topics));
    let rejected = engine.run(SyncCollection::Topics).await;
    assert!(!rejected.success);
    assert!(rejected.is_rejected());
    assert!(!rejected.is_retryable());

    // The other collection is independent.
    let news = engine.run(SyncCollection::NewsResources).await;
    assert!(news.success);

    fetcher.release.notify_one();
    let first = running.await.unwrap();
    assert!(first.success);
    assert_eq!(first.new_version, Some(ChangeListVersion::new(2)));
    assert!(!engine.is_syncing(SyncCollection::Topics));
}

#[tokio::test]
async fn test_cancelled_before_start_does_nothing() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(3)).await;
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(&remote, &store);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = engine
        .run_with_cancellation(SyncCollection::Topics, &cancel)
        .await;

    assert_eq!(result.error, Some(SyncErrorKind::Cancelled));
    assert_eq!(remote.change_list_request_count(), 0);
    assert!(store.ops().is_empty());
}

#[tokio::test]
async fn test_cancel_between_chunks_finishes_current_chunk_only() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(85)).await;
    let store = Arc::new(MemoryStore::default());
    let cancel = CancellationToken::new();

    let mut fetcher = MockFetcher::new();
    let token = cancel.clone();
    fetcher.expect_fetch_topics().times(1).returning(move |ids| {
        token.cancel();
        Ok(ids.iter().map(|id| Topic::new(id.clone(), "T")).collect())
    });

    let engine = SyncEngine::new(
        store.clone(),
        remote.clone(),
        Arc::new(fetcher),
        store.clone(),
        store.clone(),
    );

    let result = engine
        .run_with_cancellation(SyncCollection::Topics, &cancel)
        .await;

    assert_eq!(result.error, Some(SyncErrorKind::Cancelled));
    assert_eq!(result.stats.committed_chunks, 1);
    assert_eq!(store.topic_ids().len(), 40);
    assert_eq!(store.version(SyncCollection::Topics), ChangeListVersion::NEVER_SYNCED);
}

#[tokio::test]
async fn test_notify_ids_only_cover_new_resources_under_followed_topics() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_news_resources(vec![news("n1", &["t1"])]).await;
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(&remote, &store);

    let first = engine.run(SyncCollection::NewsResources).await;
    assert!(first.success);
    assert!(first.notify_ids.is_empty());

    store.follow("t1");
    remote
        .publish_news_resources(vec![
            news("n3", &["t1", "t2"]),
            news("n1", &["t1"]),
            news("n2", &["t2"]),
            news("n4", &["t1"]),
        ])
        .await;

    let second = engine.run(SyncCollection::NewsResources).await;

    assert!(second.success);
    assert!(!second.first_sync);
    assert_eq!(second.notify_ids, vec!["n3".to_string(), "n4".to_string()]);
    assert_eq!(store.news_ids().len(), 4);
    // Only the first download is auto-marked viewed.
    assert_eq!(store.viewed(), HashSet::from(["n1".to_string()]));
}

#[tokio::test]
async fn test_no_notifications_without_followed_topics() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.push_entry(SyncCollection::Topics, "t0", false).await;
    let store = Arc::new(MemoryStore::default());
    store.seed_version(SyncCollection::NewsResources, 1);
    remote
        .publish_news_resources(vec![news("n1", &["t1"]), news("n2", &["t2"])])
        .await;
    let engine = engine_with(&remote, &store);

    let result = engine.run(SyncCollection::NewsResources).await;

    assert!(result.success);
    assert!(result.notify_ids.is_empty());
    assert_eq!(store.news_ids().len(), 2);
}

#[tokio::test]
async fn test_unrequested_ids_in_batch_are_a_protocol_error() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(2)).await;
    let store = Arc::new(MemoryStore::default());

    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch_topics()
        .returning(|_| Ok(vec![Topic::new("t0", "ok"), Topic::new("intruder", "bad")]));

    let engine = SyncEngine::new(
        store.clone(),
        remote.clone(),
        Arc::new(fetcher),
        store.clone(),
        store.clone(),
    );

    let result = engine.run(SyncCollection::Topics).await;

    assert_eq!(result.error, Some(SyncErrorKind::RemoteProtocol));
    assert!(!result.is_retryable());
    assert!(store.topic_ids().is_empty());
    assert_eq!(store.version(SyncCollection::Topics), ChangeListVersion::NEVER_SYNCED);
}

#[tokio::test]
async fn test_missing_remote_ids_are_skipped() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(2)).await;
    remote.push_entry(SyncCollection::Topics, "ghost", false).await;
    let store = Arc::new(MemoryStore::default());
    let engine = engine_with(&remote, &store);

    let result = engine.run(SyncCollection::Topics).await;

    assert!(result.success);
    assert_eq!(result.stats.changed_count, 3);
    assert_eq!(result.stats.fetched_count, 2);
    assert_eq!(result.new_version, Some(ChangeListVersion::new(3)));
}

#[tokio::test]
async fn test_version_write_failure_fails_the_pass() {
    let remote = Arc::new(InMemoryRemoteSource::new());
    remote.publish_topics(topics(1)).await;
    let store = Arc::new(MemoryStore::default());

    let mut versions = MockVersions::new();
    versions
        .expect_read()
        .returning(|_| Ok(ChangeListVersion::NEVER_SYNCED));
    versions
        .expect_write()
        .times(1)
        .returning(|_, _| Err(AppError::Storage("disk full".to_string())));

    let engine = SyncEngine::new(
        Arc::new(versions),
        remote.clone(),
        remote.clone(),
        store.clone(),
        store.clone(),
    );

    let result = engine.run(SyncCollection::Topics).await;

    assert!(!result.success);
    assert_eq!(result.error, Some(SyncErrorKind::Storage));
    assert!(result.error_message.unwrap().contains("disk full"));
}
