pub mod change_list;
pub mod news_resource;
pub mod sync_result;
pub mod topic;

pub use change_list::{ChangeList, ChangeListEntry, ChangeListPartition};
pub use news_resource::{NewsResource, NewsResourceBatch, NewsResourceIdFilter, NewsResourceTopicRef};
pub use sync_result::{SyncReport, SyncResult, SyncStats};
pub use topic::Topic;
