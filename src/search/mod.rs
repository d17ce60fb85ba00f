//! Search aggregation module
//!
//! Coordinates provider calls, merges their results and reports progress.

mod aggregator;
mod progress;

pub use aggregator::{Aggregator, DEFAULT_BEST_LIMIT};
pub use progress::{emit, ProgressSink, SearchProgress};
