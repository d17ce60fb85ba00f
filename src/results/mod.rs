//! Result types and container for search results
//!
//! Every provider adapter normalizes into [`SearchResult`]; the container merges
//! them for the aggregator.

mod container;
mod types;

pub use container::{AggregatedResults, ResultContainer};
pub use types::*;
