pub mod core;
mod in_flight;
pub mod planner;

pub use self::core::SyncEngine;
pub use planner::plan_chunks;

#[cfg(test)]
mod tests;
