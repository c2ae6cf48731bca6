use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An entity collection that owns its own change list watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCollection {
    Topics,
    NewsResources,
}

impl SyncCollection {
    pub const ALL: [SyncCollection; 2] = [SyncCollection::Topics, SyncCollection::NewsResources];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncCollection::Topics => "topics",
            SyncCollection::NewsResources => "news_resources",
        }
    }
}

impl fmt::Display for SyncCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncCollection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "topics" => Ok(SyncCollection::Topics),
            "news_resources" => Ok(SyncCollection::NewsResources),
            other => Err(format!("Unknown sync collection: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for collection in SyncCollection::ALL {
            assert_eq!(collection.as_str().parse::<SyncCollection>(), Ok(collection));
        }
        assert!("posts".parse::<SyncCollection>().is_err());
    }
}
