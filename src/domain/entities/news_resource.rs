use super::Topic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewsResource {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub header_image_url: Option<String>,
    /// Persisted as Unix milliseconds; anything finer is truncated on write.
    pub publish_date: DateTime<Utc>,
    #[serde(default, rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub topic_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewsResourceTopicRef {
    pub news_resource_id: String,
    pub topic_id: String,
}

/// Writes for one fetched chunk, grouped in the order they must be applied:
/// referenced topics, then resources, then cross references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsResourceBatch {
    pub topic_shells: Vec<Topic>,
    pub resources: Vec<NewsResource>,
    pub topic_refs: Vec<NewsResourceTopicRef>,
}

impl NewsResourceBatch {
    pub fn from_resources(resources: Vec<NewsResource>) -> Self {
        let mut seen_topics = HashSet::new();
        let mut topic_shells = Vec::new();
        let mut topic_refs = Vec::new();

        for resource in &resources {
            for topic_id in &resource.topic_ids {
                if seen_topics.insert(topic_id.clone()) {
                    topic_shells.push(Topic::shell(topic_id.clone()));
                }
                topic_refs.push(NewsResourceTopicRef {
                    news_resource_id: resource.id.clone(),
                    topic_id: topic_id.clone(),
                });
            }
        }

        Self {
            topic_shells,
            resources,
            topic_refs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Optional id and topic filters for local news resource id queries.
/// `None` means "do not filter on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsResourceIdFilter {
    pub topic_ids: Option<HashSet<String>>,
    pub news_ids: Option<HashSet<String>>,
}

impl NewsResourceIdFilter {
    pub fn new(topic_ids: Option<HashSet<String>>, news_ids: Option<HashSet<String>>) -> Self {
        Self {
            topic_ids,
            news_ids,
        }
    }

    pub fn matches(&self, resource_id: &str, resource_topics: &[String]) -> bool {
        if let Some(ids) = &self.news_ids {
            if !ids.contains(resource_id) {
                return false;
            }
        }
        match &self.topic_ids {
            Some(topics) => resource_topics.iter().any(|topic| topics.contains(topic)),
            None => true,
        }
    }
}
