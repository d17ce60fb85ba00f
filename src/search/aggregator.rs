//! Multi-provider fan-out

use super::progress::{emit, ProgressSink, SearchProgress};
use crate::error::ProviderError;
use crate::metrics::Metrics;
use crate::providers::{SearchOptions, SearchProvider};
use crate::results::{AggregatedResults, ProviderResults, ResultContainer};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Size of the ranked best-results list
pub const DEFAULT_BEST_LIMIT: usize = 8;

/// Fans a query out to providers and merges their output
pub struct Aggregator {
    metrics: Option<Arc<Metrics>>,
    parallel: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            metrics: None,
            parallel: false,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Issue provider calls concurrently. Results are still merged in
    /// provider order, so dedup and ranking do not change.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Query every provider, isolating failures.
    ///
    /// A failed or timed-out provider is counted as 0 in `provider_stats`
    /// and never aborts the others.
    pub async fn aggregate(
        &self,
        query: &str,
        providers: &[Arc<dyn SearchProvider>],
        options: &SearchOptions,
        progress: Option<&ProgressSink>,
    ) -> AggregatedResults {
        info!("Aggregating '{}' over {} providers", query, providers.len());

        let outcomes = if self.parallel {
            let calls = providers
                .iter()
                .map(|p| self.call_provider(p.as_ref(), query, options, progress));
            join_all(calls).await
        } else {
            let mut outcomes = Vec::with_capacity(providers.len());
            for provider in providers {
                outcomes.push(self.call_provider(provider.as_ref(), query, options, progress).await);
            }
            outcomes
        };

        let mut container = ResultContainer::new();
        for (provider, outcome) in providers.iter().zip(outcomes) {
            match outcome {
                Ok(output) => container.add_provider_results(provider.name(), provider.priority(), output),
                Err(_) => container.add_failure(provider.name()),
            }
        }

        let aggregated = container.finish(DEFAULT_BEST_LIMIT);
        debug!(
            "Aggregated {} unique results, {} failed providers",
            aggregated.total_unique_sources,
            aggregated.failed_providers.len()
        );
        aggregated
    }

    async fn call_provider(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
        options: &SearchOptions,
        progress: Option<&ProgressSink>,
    ) -> Result<ProviderResults, ProviderError> {
        let name = provider.name().to_string();
        let limit = provider.timeout().min(options.timeout);
        let start = Instant::now();

        emit(progress, SearchProgress::ProviderStarted { provider: name.clone() });

        let outcome = match timeout(limit, provider.search(query, options)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(limit)),
        };

        let elapsed = start.elapsed().as_millis() as u64;
        match &outcome {
            Ok(output) => {
                debug!("{} returned {} results in {}ms", name, output.results.len(), elapsed);
                if let Some(ref metrics) = self.metrics {
                    metrics.record_success(&name, elapsed);
                }
                emit(
                    progress,
                    SearchProgress::ProviderFinished {
                        provider: name,
                        results: output.results.len(),
                    },
                );
            }
            Err(e) => {
                warn!("Provider {} failed: {}", name, e);
                if let Some(ref metrics) = self.metrics {
                    metrics.record_error(&name, matches!(e, ProviderError::Timeout(_)));
                }
                emit(
                    progress,
                    SearchProgress::ProviderFailed {
                        provider: name,
                        error: e.to_string(),
                    },
                );
            }
        }

        outcome
    }
}
