use crate::domain::value_objects::SyncCollection;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Tracks which collections currently have a pass running.
#[derive(Debug, Default)]
pub(super) struct InFlightCollections {
    active: Mutex<HashSet<SyncCollection>>,
}

/// Releases the collection when dropped, including on early return.
#[derive(Debug)]
pub(super) struct InFlightGuard {
    registry: Arc<InFlightCollections>,
    collection: SyncCollection,
}

impl InFlightCollections {
    pub(super) fn try_acquire(
        self: &Arc<Self>,
        collection: SyncCollection,
    ) -> Option<InFlightGuard> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(collection) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            collection,
        })
    }

    pub(super) fn is_active(&self, collection: SyncCollection) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(&collection))
            .unwrap_or(false)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut active = self
            .registry
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.collection);
    }
}
