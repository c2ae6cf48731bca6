use crate::domain::constants::NEVER_SYNCED_VERSION;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, totally ordered change list watermark for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeListVersion(i64);

impl ChangeListVersion {
    pub const NEVER_SYNCED: Self = Self(NEVER_SYNCED_VERSION);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    /// Any value at or below the sentinel counts as "never synced".
    pub fn is_never_synced(self) -> bool {
        self.0 <= NEVER_SYNCED_VERSION
    }
}

impl Default for ChangeListVersion {
    fn default() -> Self {
        Self::NEVER_SYNCED
    }
}

impl fmt::Display for ChangeListVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ChangeListVersion {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<ChangeListVersion> for i64 {
    fn from(version: ChangeListVersion) -> Self {
        version.0
    }
}
