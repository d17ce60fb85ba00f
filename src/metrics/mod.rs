//! Metrics collection module
//!
//! Tracks provider latency, error rates and orchestrator-level counters.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Latency samples kept per provider
const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    calls: u64,
    successes: u64,
    errors: u64,
    timeouts: u64,
    latencies_ms: VecDeque<u64>,
}

/// Process-local metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    searches: AtomicU64,
    cache_hits: AtomicU64,
    fallbacks: AtomicU64,
    budget_downgrades: AtomicU64,
    providers: RwLock<HashMap<String, ProviderCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_budget_downgrade(&self) {
        self.budget_downgrades.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one successful provider call
    pub fn record_success(&self, provider: &str, elapsed_ms: u64) {
        self.with_provider(provider, |c| {
            c.calls += 1;
            c.successes += 1;
            if c.latencies_ms.len() >= LATENCY_WINDOW {
                c.latencies_ms.pop_front();
            }
            c.latencies_ms.push_back(elapsed_ms);
        });
    }

    /// Record one failed provider call
    pub fn record_error(&self, provider: &str, timed_out: bool) {
        self.with_provider(provider, |c| {
            c.calls += 1;
            c.errors += 1;
            if timed_out {
                c.timeouts += 1;
            }
        });
    }

    fn with_provider<F: FnOnce(&mut ProviderCounters)>(&self, provider: &str, f: F) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        f(providers.entry(provider.to_string()).or_default());
    }

    pub fn total_searches(&self) -> u64 {
        self.searches.load(Ordering::Relaxed)
    }

    /// Get average response time for a provider
    pub fn avg_response_time(&self, provider: &str) -> Option<u64> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.get(provider).and_then(|c| average(&c.latencies_ms))
    }

    /// Success percentage, 100 when nothing was recorded
    pub fn reliability(&self, provider: &str) -> f64 {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.get(provider).map(reliability).unwrap_or(100.0)
    }

    /// Serializable copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let providers = providers
            .iter()
            .map(|(name, c)| {
                (
                    name.clone(),
                    ProviderStats {
                        calls: c.calls,
                        successes: c.successes,
                        errors: c.errors,
                        timeouts: c.timeouts,
                        avg_response_time_ms: average(&c.latencies_ms),
                        reliability: reliability(c),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            searches: self.searches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            budget_downgrades: self.budget_downgrades.load(Ordering::Relaxed),
            providers,
        }
    }
}

fn average(samples: &VecDeque<u64>) -> Option<u64> {
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<u64>() / samples.len() as u64)
    }
}

fn reliability(c: &ProviderCounters) -> f64 {
    if c.calls == 0 {
        100.0
    } else {
        (c.successes as f64 / c.calls as f64) * 100.0
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub successes: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub avg_response_time_ms: Option<u64>,
    pub reliability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub searches: u64,
    pub cache_hits: u64,
    pub fallbacks: u64,
    pub budget_downgrades: u64,
    pub providers: HashMap<String, ProviderStats>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let metrics = Metrics::new();

        metrics.inc_search();
        metrics.record_success("serper", 100);
        metrics.record_success("serper", 300);
        metrics.record_error("serper", true);

        assert_eq!(metrics.total_searches(), 1);
        assert_eq!(metrics.avg_response_time("serper"), Some(200));
        assert!((metrics.reliability("serper") - 66.666).abs() < 0.01);
        assert_eq!(metrics.reliability("brave"), 100.0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.providers["serper"].timeouts, 1);
        assert_eq!(snapshot.providers["serper"].calls, 3);
    }

    #[test]
    fn test_latency_window() {
        let metrics = Metrics::new();
        for _ in 0..LATENCY_WINDOW {
            metrics.record_success("wikipedia", 1000);
        }
        metrics.record_success("wikipedia", 0);
        assert_eq!(metrics.avg_response_time("wikipedia"), Some(990));
    }
}
