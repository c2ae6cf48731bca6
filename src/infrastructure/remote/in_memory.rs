use crate::application::ports::{BatchFetcher, ChangeListSource};
use crate::domain::constants::SYNC_BATCH_SIZE;
use crate::domain::entities::{ChangeList, ChangeListEntry, NewsResource, Topic};
use crate::domain::value_objects::{ChangeListVersion, SyncCollection};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct RemoteState {
    version: i64,
    topics: HashMap<String, Topic>,
    news_resources: HashMap<String, NewsResource>,
    topic_log: Vec<ChangeListEntry>,
    news_log: Vec<ChangeListEntry>,
}

impl RemoteState {
    fn next_version(&mut self) -> i64 {
        self.version += 1;
        self.version
    }

    fn log(&self, collection: SyncCollection) -> &[ChangeListEntry] {
        match collection {
            SyncCollection::Topics => &self.topic_log,
            SyncCollection::NewsResources => &self.news_log,
        }
    }
}

/// Fixture format accepted by [`InMemoryRemoteSource::from_fixture_json`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFixture {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub news_resources: Vec<NewsResource>,
}

/// A versioned, in-process stand-in for the remote API. Every publish or
/// delete appends to the collection's change log under a new global version.
#[derive(Debug)]
pub struct InMemoryRemoteSource {
    state: RwLock<RemoteState>,
    max_batch_size: usize,
    offline: AtomicBool,
    fail_batch_at: AtomicUsize,
    batch_requests: AtomicUsize,
    change_list_requests: AtomicU64,
    requested_batches: RwLock<Vec<Vec<String>>>,
}

impl Default for InMemoryRemoteSource {
    fn default() -> Self {
        Self {
            state: RwLock::new(RemoteState::default()),
            max_batch_size: SYNC_BATCH_SIZE,
            offline: AtomicBool::new(false),
            fail_batch_at: AtomicUsize::new(0),
            batch_requests: AtomicUsize::new(0),
            change_list_requests: AtomicU64::new(0),
            requested_batches: RwLock::new(Vec::new()),
        }
    }
}

impl InMemoryRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest id list a single batch request may carry.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub async fn from_fixture(fixture: RemoteFixture) -> Self {
        let remote = Self::new();
        remote.publish_topics(fixture.topics).await;
        remote.publish_news_resources(fixture.news_resources).await;
        remote
    }

    pub async fn from_fixture_json(json: &str) -> Result<Self, AppError> {
        let fixture: RemoteFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture).await)
    }

    pub async fn publish_topics(&self, topics: Vec<Topic>) {
        let mut state = self.state.write().await;
        for topic in topics {
            let version = state.next_version();
            state
                .topic_log
                .push(ChangeListEntry::changed(topic.id.clone(), version));
            state.topics.insert(topic.id.clone(), topic);
        }
    }

    pub async fn publish_news_resources(&self, resources: Vec<NewsResource>) {
        let mut state = self.state.write().await;
        for resource in resources {
            let version = state.next_version();
            state
                .news_log
                .push(ChangeListEntry::changed(resource.id.clone(), version));
            state.news_resources.insert(resource.id.clone(), resource);
        }
    }

    pub async fn delete(&self, collection: SyncCollection, id: &str) {
        let mut state = self.state.write().await;
        let version = state.next_version();
        let entry = ChangeListEntry::deleted(id, version);
        match collection {
            SyncCollection::Topics => {
                state.topics.remove(id);
                state.topic_log.push(entry);
            }
            SyncCollection::NewsResources => {
                state.news_resources.remove(id);
                state.news_log.push(entry);
            }
        }
    }

    /// Appends a raw entry without touching the payload maps.
    pub async fn push_entry(&self, collection: SyncCollection, id: &str, deleted: bool) {
        let mut state = self.state.write().await;
        let version = state.next_version();
        let entry = ChangeListEntry {
            id: id.to_string(),
            deleted,
            version: ChangeListVersion::new(version),
        };
        match collection {
            SyncCollection::Topics => state.topic_log.push(entry),
            SyncCollection::NewsResources => state.news_log.push(entry),
        }
    }

    pub async fn current_version(&self) -> ChangeListVersion {
        ChangeListVersion::new(self.state.read().await.version)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes the `nth` batch request from now on (1-based) fail as unavailable.
    /// `0` disables the failure.
    pub fn fail_batch_request(&self, nth: usize) {
        let target = if nth == 0 {
            0
        } else {
            self.batch_requests.load(Ordering::SeqCst) + nth
        };
        self.fail_batch_at.store(target, Ordering::SeqCst);
    }

    pub fn batch_request_count(&self) -> usize {
        self.batch_requests.load(Ordering::SeqCst)
    }

    pub fn change_list_request_count(&self) -> u64 {
        self.change_list_requests.load(Ordering::SeqCst)
    }

    pub async fn requested_batches(&self) -> Vec<Vec<String>> {
        self.requested_batches.read().await.clone()
    }

    fn ensure_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable(
                "remote source is offline".to_string(),
            ));
        }
        Ok(())
    }

    async fn begin_batch(&self, ids: &[String]) -> Result<(), AppError> {
        self.ensure_online()?;
        if ids.len() > self.max_batch_size {
            return Err(AppError::RemoteProtocol(format!(
                "batch of {} ids exceeds the limit of {}",
                ids.len(),
                self.max_batch_size
            )));
        }
        let request = self.batch_requests.fetch_add(1, Ordering::SeqCst) + 1;
        if request == self.fail_batch_at.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable(format!(
                "batch request {request} dropped"
            )));
        }
        self.requested_batches.write().await.push(ids.to_vec());
        Ok(())
    }
}

#[async_trait]
impl ChangeListSource for InMemoryRemoteSource {
    async fn change_list(
        &self,
        collection: SyncCollection,
        since: ChangeListVersion,
    ) -> Result<ChangeList, AppError> {
        self.ensure_online()?;
        self.change_list_requests.fetch_add(1, Ordering::SeqCst);

        let state = self.state.read().await;
        let entries: Vec<ChangeListEntry> = state
            .log(collection)
            .iter()
            .filter(|entry| entry.version > since)
            .cloned()
            .collect();
        let latest_version = entries
            .iter()
            .map(|entry| entry.version)
            .max()
            .unwrap_or(since);

        Ok(ChangeList::new(entries, latest_version))
    }
}

#[async_trait]
impl BatchFetcher for InMemoryRemoteSource {
    async fn fetch_topics(&self, ids: &[String]) -> Result<Vec<Topic>, AppError> {
        self.begin_batch(ids).await?;
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.topics.get(id).cloned())
            .collect())
    }

    async fn fetch_news_resources(&self, ids: &[String]) -> Result<Vec<NewsResource>, AppError> {
        self.begin_batch(ids).await?;
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.news_resources.get(id).cloned())
            .collect())
    }
}
