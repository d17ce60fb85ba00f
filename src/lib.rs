//! search-orchestrator: cost-aware search orchestration
//!
//! Picks a search strategy from the query and the caller's subscription tier,
//! serves repeated queries from a TTL cache, fans out to paid and free search
//! providers, optionally reads the top pages and asks an LLM for a cited
//! summary. Every failure degrades to a free-provider search.

pub mod cache;
pub mod config;
pub mod cost;
pub mod error;
pub mod fetch;
pub mod llm;
pub mod metrics;
pub mod network;
pub mod orchestrator;
pub mod providers;
pub mod results;
pub mod search;
pub mod strategy;
pub mod summarize;
pub mod web;

pub use cache::SearchCache;
pub use config::Settings;
pub use error::{ProviderError, SearchError};
pub use orchestrator::{BillingProfile, Orchestrator, OrchestratorState};
pub use providers::{ProviderRegistry, SearchProvider};
pub use results::{SearchResponse, SearchResult};
pub use search::{ProgressSink, SearchProgress};
pub use strategy::{select_strategy, Strategy, StrategyKind, Tier};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timeout for provider requests in seconds
pub const DEFAULT_TIMEOUT: u64 = 5;

/// Maximum timeout that can be set
pub const MAX_TIMEOUT: u64 = 30;
