pub mod batch_fetcher;
pub mod change_list_source;
pub mod local_store;
pub mod news_notifier;
pub mod user_preferences;
pub mod version_store;

pub use batch_fetcher::BatchFetcher;
pub use change_list_source::ChangeListSource;
pub use local_store::LocalStore;
pub use news_notifier::NewsNotifier;
pub use user_preferences::UserPreferences;
pub use version_store::VersionStore;
