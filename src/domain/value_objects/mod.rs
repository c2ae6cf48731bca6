pub mod change_list_version;
pub mod sync_collection;

pub use change_list_version::ChangeListVersion;
pub use sync_collection::SyncCollection;
