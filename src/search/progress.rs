//! Progress events pushed while a search runs

use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Receiving side is owned by the caller; a dropped receiver is ignored
pub type ProgressSink = UnboundedSender<SearchProgress>;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchProgress {
    StrategySelected { strategy: &'static str },
    CacheHit,
    BudgetExceeded,
    ProviderStarted { provider: String },
    ProviderFinished { provider: String, results: usize },
    ProviderFailed { provider: String, error: String },
    FetchingContent { pages: usize },
    Summarizing,
    FallingBack,
    Completed { results: usize },
}

impl fmt::Display for SearchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrategySelected { strategy } => write!(f, "Using {} search strategy", strategy),
            Self::CacheHit => f.write_str("Found cached results"),
            Self::BudgetExceeded => f.write_str("Monthly budget reached, using free search"),
            Self::ProviderStarted { provider } => write!(f, "Searching {}...", provider),
            Self::ProviderFinished { provider, results } => {
                write!(f, "{} returned {} results", provider, results)
            }
            Self::ProviderFailed { provider, .. } => write!(f, "{} unavailable", provider),
            Self::FetchingContent { pages } => write!(f, "Reading {} pages...", pages),
            Self::Summarizing => f.write_str("Analyzing results..."),
            Self::FallingBack => f.write_str("Switching to free search"),
            Self::Completed { results } => write!(f, "Search complete: {} results", results),
        }
    }
}

/// Push an event when a sink is attached
pub fn emit(sink: Option<&ProgressSink>, event: SearchProgress) {
    if let Some(sink) = sink {
        let _ = sink.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let event = SearchProgress::ProviderFinished {
            provider: "serper".to_string(),
            results: 8,
        };
        assert_eq!(event.to_string(), "serper returned 8 results");
        assert_eq!(SearchProgress::CacheHit.to_string(), "Found cached results");
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        emit(Some(&tx), SearchProgress::Summarizing);
        emit(None, SearchProgress::Summarizing);
    }
}
