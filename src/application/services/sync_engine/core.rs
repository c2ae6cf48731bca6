use super::in_flight::InFlightCollections;
use super::planner::plan_chunks;
use crate::application::ports::{
    BatchFetcher, ChangeListSource, LocalStore, UserPreferences, VersionStore,
};
use crate::domain::constants::SYNC_BATCH_SIZE;
use crate::domain::entities::{NewsResourceBatch, NewsResourceIdFilter, SyncResult, SyncStats};
use crate::domain::value_objects::{ChangeListVersion, SyncCollection};
use crate::infrastructure::sync::metrics;
use crate::shared::error::AppError;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(SYNC_BATCH_SIZE) {
    Some(size) => size,
    None => panic!("SYNC_BATCH_SIZE must be non-zero"),
};

/// Reconciles the local dataset with the remote change lists, one collection
/// pass at a time.
pub struct SyncEngine {
    versions: Arc<dyn VersionStore>,
    change_lists: Arc<dyn ChangeListSource>,
    fetcher: Arc<dyn BatchFetcher>,
    local: Arc<dyn LocalStore>,
    preferences: Arc<dyn UserPreferences>,
    batch_size: NonZeroUsize,
    in_flight: Arc<InFlightCollections>,
}

/// Mutable bookkeeping for one pass, kept outside the fallible body so that a
/// failed pass can still report what it got through.
#[derive(Debug, Default)]
struct PassProgress {
    first_sync: bool,
    stats: SyncStats,
}

/// Interest snapshot taken before any news resource is written.
struct NotifyBaseline {
    followed_topic_ids: HashSet<String>,
    already_known: HashSet<String>,
}

impl SyncEngine {
    pub fn new(
        versions: Arc<dyn VersionStore>,
        change_lists: Arc<dyn ChangeListSource>,
        fetcher: Arc<dyn BatchFetcher>,
        local: Arc<dyn LocalStore>,
        preferences: Arc<dyn UserPreferences>,
    ) -> Self {
        Self {
            versions,
            change_lists,
            fetcher,
            local,
            preferences,
            batch_size: DEFAULT_BATCH_SIZE,
            in_flight: Arc::new(InFlightCollections::default()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    pub fn local_store(&self) -> Arc<dyn LocalStore> {
        Arc::clone(&self.local)
    }

    pub fn is_syncing(&self, collection: SyncCollection) -> bool {
        self.in_flight.is_active(collection)
    }

    pub async fn run(&self, collection: SyncCollection) -> SyncResult {
        self.run_with_cancellation(collection, &CancellationToken::new())
            .await
    }

    /// Runs one pass for `collection`. A second call for a collection that is
    /// already syncing is rejected without touching any state.
    pub async fn run_with_cancellation(
        &self,
        collection: SyncCollection,
        cancel: &CancellationToken,
    ) -> SyncResult {
        let Some(_guard) = self.in_flight.try_acquire(collection) else {
            tracing::debug!(
                target: "sync::engine",
                %collection,
                "sync pass rejected, another pass is running"
            );
            metrics::record_rejected(collection);
            return SyncResult::rejected(collection);
        };

        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("sync_pass", %collection, %run_id);
        let mut progress = PassProgress::default();

        let outcome = self
            .execute(collection, cancel, &mut progress)
            .instrument(span)
            .await;

        match outcome {
            Ok((version, notify_ids)) => {
                metrics::record_success(collection, progress.stats);
                tracing::info!(
                    target: "sync::engine",
                    %collection,
                    %run_id,
                    version = version.value(),
                    first_sync = progress.first_sync,
                    fetched = progress.stats.fetched_count,
                    deleted = progress.stats.deleted_count,
                    notify = notify_ids.len(),
                    "sync pass committed"
                );
                SyncResult::succeeded(
                    collection,
                    progress.first_sync,
                    version,
                    notify_ids,
                    progress.stats,
                )
            }
            Err(err) => {
                let kind = err.kind();
                metrics::record_failure(collection, kind, progress.stats);
                tracing::warn!(
                    target: "sync::engine",
                    %collection,
                    %run_id,
                    error = %err,
                    kind = kind.as_str(),
                    committed_chunks = progress.stats.committed_chunks,
                    "sync pass aborted, watermark unchanged"
                );
                SyncResult::from_error(collection, progress.first_sync, &err, progress.stats)
            }
        }
    }

    async fn execute(
        &self,
        collection: SyncCollection,
        cancel: &CancellationToken,
        progress: &mut PassProgress,
    ) -> Result<(ChangeListVersion, Vec<String>), AppError> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let current = self.versions.read(collection).await?;
        progress.first_sync = current.is_never_synced();

        let change_list = self.change_lists.change_list(collection, current).await?;
        let partition = change_list.partition();
        progress.stats.deleted_count = partition.deleted_ids.len() as u32;
        progress.stats.changed_count = partition.changed_ids.len() as u32;

        tracing::debug!(
            target: "sync::engine",
            since = current.value(),
            latest = change_list.latest_version.value(),
            deleted = partition.deleted_ids.len(),
            changed = partition.changed_ids.len(),
            first_sync = progress.first_sync,
            "change list fetched"
        );

        if !partition.deleted_ids.is_empty() {
            match collection {
                SyncCollection::Topics => self.local.delete_topics(&partition.deleted_ids).await?,
                SyncCollection::NewsResources => {
                    self.local
                        .delete_news_resources(&partition.deleted_ids)
                        .await?
                }
            }
        }

        let chunks = plan_chunks(&partition.changed_ids, self.batch_size);
        progress.stats.chunk_count = chunks.len() as u32;

        let baseline = match collection {
            SyncCollection::Topics => {
                self.apply_topic_chunks(&chunks, cancel, progress).await?;
                None
            }
            SyncCollection::NewsResources => {
                let baseline = self
                    .prepare_news_pass(&partition.changed_ids, progress.first_sync)
                    .await?;
                self.apply_news_chunks(&chunks, cancel, progress).await?;
                baseline
            }
        };

        let new_version = current.max(change_list.high_water_mark());
        self.versions.write(collection, new_version).await?;

        let notify_ids = match baseline {
            Some(baseline) => {
                self.resolve_notify_ids(&partition.changed_ids, baseline)
                    .await
            }
            None => Vec::new(),
        };

        Ok((new_version, notify_ids))
    }

    /// On a first pass every incoming id is marked viewed up front so nothing
    /// from the initial download is later treated as new. Otherwise captures
    /// which changed ids were already stored under followed topics.
    async fn prepare_news_pass(
        &self,
        changed_ids: &[String],
        first_sync: bool,
    ) -> Result<Option<NotifyBaseline>, AppError> {
        if first_sync {
            if !changed_ids.is_empty() {
                self.preferences
                    .set_news_resources_viewed(changed_ids, true)
                    .await?;
            }
            return Ok(None);
        }

        let followed_topic_ids = self.preferences.followed_topic_ids().await?;
        if followed_topic_ids.is_empty() || changed_ids.is_empty() {
            return Ok(Some(NotifyBaseline {
                followed_topic_ids,
                already_known: HashSet::new(),
            }));
        }

        let already_known = self
            .local
            .query_news_resource_ids(&NewsResourceIdFilter::new(
                Some(followed_topic_ids.clone()),
                Some(changed_ids.iter().cloned().collect()),
            ))
            .await?;

        Ok(Some(NotifyBaseline {
            followed_topic_ids,
            already_known,
        }))
    }

    async fn apply_topic_chunks(
        &self,
        chunks: &[Vec<String>],
        cancel: &CancellationToken,
        progress: &mut PassProgress,
    ) -> Result<(), AppError> {
        for (index, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            let topics = self.fetcher.fetch_topics(chunk).await?;
            ensure_requested(chunk, topics.iter().map(|topic| topic.id.as_str()))?;
            self.local.upsert_topics(&topics).await?;

            progress.stats.fetched_count += topics.len() as u32;
            progress.stats.committed_chunks += 1;
            tracing::debug!(
                target: "sync::engine",
                chunk = index,
                requested = chunk.len(),
                received = topics.len(),
                "topic chunk committed"
            );
        }
        Ok(())
    }

    async fn apply_news_chunks(
        &self,
        chunks: &[Vec<String>],
        cancel: &CancellationToken,
        progress: &mut PassProgress,
    ) -> Result<(), AppError> {
        for (index, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            let resources = self.fetcher.fetch_news_resources(chunk).await?;
            ensure_requested(chunk, resources.iter().map(|resource| resource.id.as_str()))?;

            let received = resources.len();
            let batch = NewsResourceBatch::from_resources(resources);
            if !batch.is_empty() {
                self.local.apply_news_batch(&batch).await?;
            }

            progress.stats.fetched_count += received as u32;
            progress.stats.committed_chunks += 1;
            tracing::debug!(
                target: "sync::engine",
                chunk = index,
                requested = chunk.len(),
                received,
                topic_refs = batch.topic_refs.len(),
                "news resource chunk committed"
            );
        }
        Ok(())
    }

    /// Runs after the watermark commit, so a failure here only drops
    /// notifications and never fails the pass.
    async fn resolve_notify_ids(
        &self,
        changed_ids: &[String],
        baseline: NotifyBaseline,
    ) -> Vec<String> {
        if baseline.followed_topic_ids.is_empty() {
            return Vec::new();
        }

        let candidates: HashSet<String> = changed_ids
            .iter()
            .filter(|id| !baseline.already_known.contains(*id))
            .cloned()
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let filter = NewsResourceIdFilter::new(Some(baseline.followed_topic_ids), Some(candidates));
        match self.local.query_news_resource_ids(&filter).await {
            Ok(added) => changed_ids
                .iter()
                .filter(|id| added.contains(*id))
                .cloned()
                .collect(),
            Err(err) => {
                tracing::warn!(
                    target: "sync::engine",
                    error = %err,
                    "failed to resolve newly added news resources"
                );
                Vec::new()
            }
        }
    }
}

/// Rejects payloads carrying ids that were not requested or that repeat.
fn ensure_requested<'a>(
    requested: &[String],
    received: impl Iterator<Item = &'a str>,
) -> Result<(), AppError> {
    let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    for id in received {
        if !requested_set.contains(id) {
            return Err(AppError::RemoteProtocol(format!(
                "Batch response contains unrequested id {id}"
            )));
        }
        if !seen.insert(id) {
            return Err(AppError::RemoteProtocol(format!(
                "Batch response contains duplicate id {id}"
            )));
        }
    }
    Ok(())
}
