pub mod database;
pub mod notifications;
pub mod remote;
pub mod sync;

pub use database::{ConnectionPool, SqliteSyncStore};
pub use notifications::TracingNewsNotifier;
pub use remote::InMemoryRemoteSource;
