//! Cost model
//!
//! Pure functions estimating the USD cost of running a strategy. Each line item
//! is non-negative and independent of the others.

use crate::strategy::{ProviderSet, Strategy};
use serde::Serialize;

/// Per-query cost of a generic paid web-search API
pub const GENERIC_QUERY_COST_USD: f64 = 0.001;

/// Per-query cost of the realtime rich-data provider
pub const PREMIUM_QUERY_COST_USD: f64 = 0.01;

/// Per-page cost of content fetching
pub const CONTENT_FETCH_COST_USD: f64 = 0.0002;

/// Flat per-request cost of AI analysis
pub const AI_ANALYSIS_COST_USD: f64 = 0.002;

/// Line items of an estimate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub provider_usd: f64,
    pub content_usd: f64,
    pub ai_usd: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.provider_usd + self.content_usd + self.ai_usd
    }
}

/// Itemized estimate for `num_queries` runs of `strategy`
pub fn breakdown(strategy: &Strategy, num_queries: usize, uses_premium_provider: bool) -> CostBreakdown {
    let queries = num_queries as f64;

    let per_query = if uses_premium_provider || strategy.provider_set == ProviderSet::Premium {
        PREMIUM_QUERY_COST_USD
    } else if strategy.provider_set == ProviderSet::Free {
        0.0
    } else {
        GENERIC_QUERY_COST_USD
    };

    let content_usd = if strategy.fetch_content {
        CONTENT_FETCH_COST_USD * strategy.max_results as f64 * queries
    } else {
        0.0
    };

    let ai_usd = if strategy.use_ai_analysis {
        AI_ANALYSIS_COST_USD * queries
    } else {
        0.0
    };

    CostBreakdown {
        provider_usd: per_query * queries,
        content_usd,
        ai_usd,
    }
}

/// Estimated total cost in USD
pub fn estimate_cost(strategy: &Strategy, num_queries: usize, uses_premium_provider: bool) -> f64 {
    breakdown(strategy, num_queries, uses_premium_provider).total()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{StrategyKind, BUDGET, QUICK, SERPAPI, STANDARD};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quick_is_free() {
        assert_eq!(estimate_cost(&QUICK, 1, false), 0.0);
    }

    #[test]
    fn test_standard_components_add_up() {
        let items = breakdown(&STANDARD, 1, false);
        assert!(approx(items.provider_usd, GENERIC_QUERY_COST_USD));
        assert!(approx(items.content_usd, CONTENT_FETCH_COST_USD * 8.0));
        assert!(approx(items.ai_usd, AI_ANALYSIS_COST_USD));
        assert!(approx(estimate_cost(&STANDARD, 1, false), items.total()));
    }

    #[test]
    fn test_premium_flag_raises_base_cost() {
        assert!(estimate_cost(&BUDGET, 1, true) > estimate_cost(&BUDGET, 1, false));
        assert!(approx(breakdown(&SERPAPI, 1, false).provider_usd, PREMIUM_QUERY_COST_USD));
    }

    #[test]
    fn test_scales_with_queries() {
        assert!(approx(estimate_cost(&STANDARD, 3, false), 3.0 * estimate_cost(&STANDARD, 1, false)));
        assert_eq!(estimate_cost(&STANDARD, 0, false), 0.0);
    }

    #[test]
    fn test_strategies_ordered_by_cost() {
        let costs: Vec<f64> = StrategyKind::ALL
            .iter()
            .map(|k| estimate_cost(k.strategy(), 1, false))
            .collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1]), "{:?}", costs);
        assert!(costs.iter().all(|c| *c >= 0.0));
    }
}
