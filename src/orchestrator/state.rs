//! Per-session billing state

use crate::strategy::Tier;
use serde::{Deserialize, Serialize};

/// Tier and budget pushed in by the hosting application
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BillingProfile {
    pub tier: Tier,
    pub monthly_budget_usd: f64,
}

impl BillingProfile {
    pub fn new(tier: Tier, monthly_budget_usd: f64) -> Self {
        Self {
            tier,
            monthly_budget_usd: monthly_budget_usd.max(0.0),
        }
    }
}

impl From<&crate::config::BillingSettings> for BillingProfile {
    fn from(settings: &crate::config::BillingSettings) -> Self {
        Self::new(settings.tier, settings.monthly_budget_usd)
    }
}

/// Counters owned by one orchestrator instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorState {
    pub tier: Tier,
    /// Non-cached, non-degraded searches since the last reset
    pub monthly_search_count: u64,
    pub monthly_budget_usd: f64,
}

impl OrchestratorState {
    pub fn new(billing: BillingProfile) -> Self {
        Self {
            tier: billing.tier,
            monthly_search_count: 0,
            monthly_budget_usd: billing.monthly_budget_usd,
        }
    }

    /// Admission gate: projected spend at this cost exceeds the budget
    pub fn over_budget(&self, cost_per_search: f64) -> bool {
        self.monthly_search_count as f64 * cost_per_search > self.monthly_budget_usd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_over_budget() {
        let mut state = OrchestratorState::new(BillingProfile::new(Tier::Pro, 0.01));
        assert!(!state.over_budget(0.012));

        state.monthly_search_count = 1;
        assert!(state.over_budget(0.012));
        assert!(!state.over_budget(0.0));
    }

    #[test]
    fn test_negative_budget_clamped() {
        assert_eq!(BillingProfile::new(Tier::Free, -5.0).monthly_budget_usd, 0.0);
    }
}
