use crate::domain::value_objects::ChangeListVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeListEntry {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub version: ChangeListVersion,
}

impl ChangeListEntry {
    pub fn changed(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: id.into(),
            deleted: false,
            version: ChangeListVersion::new(version),
        }
    }

    pub fn deleted(id: impl Into<String>, version: i64) -> Self {
        Self {
            id: id.into(),
            deleted: true,
            version: ChangeListVersion::new(version),
        }
    }
}

/// Changes reported by the remote for one collection since a watermark.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeList {
    pub entries: Vec<ChangeListEntry>,
    pub latest_version: ChangeListVersion,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeListPartition {
    pub deleted_ids: Vec<String>,
    pub changed_ids: Vec<String>,
}

impl ChangeList {
    pub fn new(entries: Vec<ChangeListEntry>, latest_version: ChangeListVersion) -> Self {
        Self {
            entries,
            latest_version,
        }
    }

    /// Highest version observed, either collection-level or on any entry.
    pub fn high_water_mark(&self) -> ChangeListVersion {
        self.entries
            .iter()
            .map(|entry| entry.version)
            .fold(self.latest_version, ChangeListVersion::max)
    }

    /// Splits entries into deletions and changes, keeping first-seen order and
    /// dropping duplicates. An id reported as deleted anywhere in the list is
    /// never reported as changed.
    pub fn partition(&self) -> ChangeListPartition {
        let deleted: HashSet<&str> = self
            .entries
            .iter()
            .filter(|entry| entry.deleted)
            .map(|entry| entry.id.as_str())
            .collect();

        let mut seen_deleted = HashSet::new();
        let mut seen_changed = HashSet::new();
        let mut partition = ChangeListPartition::default();

        for entry in &self.entries {
            let id = entry.id.as_str();
            if deleted.contains(id) {
                if seen_deleted.insert(id) {
                    partition.deleted_ids.push(entry.id.clone());
                }
            } else if seen_changed.insert(id) {
                partition.changed_ids.push(entry.id.clone());
            }
        }

        partition
    }
}
