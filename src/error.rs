//! Error taxonomy for providers and search paths
//!
//! None of these reach the caller of [`crate::Orchestrator::search`]: provider
//! errors are absorbed by the aggregator and search errors trigger the free
//! fallback path.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single provider adapter
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("API key not configured")]
    MissingApiKey,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("rate limited by provider")]
    RateLimited,
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Whether a single retry inside the adapter may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited | Self::Network(_) => true,
            Self::Status(code) => *code >= 500,
            _ => false,
        }
    }

    /// Map a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        if status == 429 {
            Self::RateLimited
        } else {
            Self::Status(status)
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Failure of a whole dispatch path
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    #[error("no {0} providers configured")]
    NoProviders(&'static str),
    #[error("all {attempted} providers failed")]
    AllProvidersFailed { attempted: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Status(503).is_retryable());
        assert!(!ProviderError::Status(404).is_retryable());
        assert!(!ProviderError::MissingApiKey.is_retryable());
        assert_eq!(ProviderError::from_status(429), ProviderError::RateLimited);
    }
}
