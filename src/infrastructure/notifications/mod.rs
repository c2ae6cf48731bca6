pub mod tracing_notifier;

pub use tracing_notifier::TracingNewsNotifier;
