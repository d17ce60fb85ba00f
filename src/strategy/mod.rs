//! Search strategies and tier-gated strategy selection
//!
//! A [`Strategy`] is a read-only template. The five canonical strategies live
//! in statics so that selection hands out `&'static` references and never
//! mutates anything per request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which provider tiers a strategy draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSet {
    /// Free, keyless engines only
    Free,
    /// Paid web-search APIs
    Paid,
    /// Paid APIs plus free engines
    Hybrid,
    /// The realtime rich-data provider
    Premium,
}

/// Immutable bundle of search parameters
#[derive(Debug, PartialEq, Serialize)]
pub struct Strategy {
    pub kind: StrategyKind,
    pub name: &'static str,
    pub max_results: usize,
    pub fetch_content: bool,
    pub use_ai_analysis: bool,
    pub use_free_providers: bool,
    pub provider_set: ProviderSet,
    /// Upper bound on fetched page text per result
    pub content_char_limit: usize,
    pub timeout_ms: u64,
    pub caching_enabled: bool,
}

impl Strategy {
    /// Whether the premium realtime provider serves this strategy
    pub fn uses_premium_provider(&self) -> bool {
        self.provider_set == ProviderSet::Premium
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

pub static QUICK: Strategy = Strategy {
    kind: StrategyKind::Quick,
    name: "quick",
    max_results: 5,
    fetch_content: false,
    use_ai_analysis: false,
    use_free_providers: true,
    provider_set: ProviderSet::Free,
    content_char_limit: 0,
    timeout_ms: 4_000,
    caching_enabled: true,
};

pub static BUDGET: Strategy = Strategy {
    kind: StrategyKind::Budget,
    name: "budget",
    max_results: 5,
    fetch_content: false,
    use_ai_analysis: false,
    use_free_providers: false,
    provider_set: ProviderSet::Paid,
    content_char_limit: 0,
    timeout_ms: 5_000,
    caching_enabled: true,
};

pub static STANDARD: Strategy = Strategy {
    kind: StrategyKind::Standard,
    name: "standard",
    max_results: 8,
    fetch_content: true,
    use_ai_analysis: true,
    use_free_providers: true,
    provider_set: ProviderSet::Hybrid,
    content_char_limit: 2_000,
    timeout_ms: 8_000,
    caching_enabled: true,
};

pub static PREMIUM: Strategy = Strategy {
    kind: StrategyKind::Premium,
    name: "premium",
    max_results: 10,
    fetch_content: true,
    use_ai_analysis: true,
    use_free_providers: false,
    provider_set: ProviderSet::Paid,
    content_char_limit: 3_000,
    timeout_ms: 10_000,
    caching_enabled: true,
};

pub static SERPAPI: Strategy = Strategy {
    kind: StrategyKind::Serpapi,
    name: "serpapi",
    max_results: 10,
    fetch_content: false,
    use_ai_analysis: true,
    use_free_providers: false,
    provider_set: ProviderSet::Premium,
    content_char_limit: 0,
    timeout_ms: 8_000,
    caching_enabled: true,
};

/// Strategy names, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Quick,
    Budget,
    Standard,
    Premium,
    Serpapi,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        Self::Quick,
        Self::Budget,
        Self::Standard,
        Self::Premium,
        Self::Serpapi,
    ];

    /// Look up the canonical strategy
    pub fn strategy(self) -> &'static Strategy {
        match self {
            Self::Quick => &QUICK,
            Self::Budget => &BUDGET,
            Self::Standard => &STANDARD,
            Self::Premium => &PREMIUM,
            Self::Serpapi => &SERPAPI,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy().name)
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "budget" => Ok(Self::Budget),
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            "serpapi" | "realtime" => Ok(Self::Serpapi),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// Subscription tier of the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Starter,
    Standard,
    Pro,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Standard => "standard",
            Self::Pro => "pro",
        };
        f.write_str(name)
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "starter" => Ok(Self::Starter),
            "standard" => Ok(Self::Standard),
            "pro" => Ok(Self::Pro),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// Queries longer than this many words count as long
pub const LONG_QUERY_WORDS: usize = 10;

/// Queries longer than this many words count as very long
pub const VERY_LONG_QUERY_WORDS: usize = 20;

const COMPLEXITY_MARKERS: &[&str] = &[
    "analyze",
    "analyse",
    "analysis",
    "compare",
    "comparison",
    "research",
    "comprehensive",
    "explain",
    "evaluate",
    "versus",
    "vs",
];

const RECENCY_MARKERS: &[&str] = &[
    "latest", "today", "current", "news", "recent", "now", "breaking", "this week",
];

/// Heuristic features extracted from a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTraits {
    pub word_count: usize,
    pub complex: bool,
    pub recent: bool,
}

impl QueryTraits {
    pub fn analyze(query: &str) -> Self {
        let lower = query.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let has_marker = |markers: &[&str]| {
            markers.iter().any(|marker| {
                if marker.contains(' ') {
                    lower.contains(marker)
                } else {
                    words.iter().any(|w| w == marker)
                }
            })
        };

        Self {
            word_count: query.split_whitespace().count(),
            complex: has_marker(COMPLEXITY_MARKERS),
            recent: has_marker(RECENCY_MARKERS),
        }
    }

    pub fn is_long(&self) -> bool {
        self.word_count > LONG_QUERY_WORDS
    }

    pub fn is_very_long(&self) -> bool {
        self.word_count > VERY_LONG_QUERY_WORDS
    }
}

/// Choose a strategy from query heuristics, capped by the caller's tier
pub fn select_strategy(query: &str, tier: Tier) -> &'static Strategy {
    let traits = QueryTraits::analyze(query);

    match tier {
        Tier::Free => &QUICK,
        Tier::Starter => {
            if traits.complex || traits.is_long() {
                &STANDARD
            } else {
                &BUDGET
            }
        }
        Tier::Standard => {
            if traits.complex && traits.is_very_long() {
                &SERPAPI
            } else if traits.complex || traits.recent || traits.is_long() {
                &STANDARD
            } else {
                &BUDGET
            }
        }
        Tier::Pro => {
            if traits.complex || traits.recent || traits.is_long() {
                &SERPAPI
            } else {
                &STANDARD
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERIES: &[&str] = &[
        "rust",
        "compare the latest inflation data",
        "comprehensive research on the current state of battery technology for electric vehicles in northern europe and asia and africa over the next decade today",
        "news today",
        "",
    ];

    #[test]
    fn test_free_tier_always_quick() {
        for query in QUERIES {
            assert!(std::ptr::eq(select_strategy(query, Tier::Free), &QUICK));
        }
    }

    #[test]
    fn test_pro_complex_recent_gets_richest() {
        let strategy = select_strategy("compare the latest inflation data", Tier::Pro);
        assert_eq!(strategy.kind, StrategyKind::Serpapi);
        assert!(strategy.uses_premium_provider());
    }

    #[test]
    fn test_pro_simple_gets_mid() {
        assert_eq!(select_strategy("rust", Tier::Pro).kind, StrategyKind::Standard);
    }

    #[test]
    fn test_starter_ceiling() {
        assert_eq!(select_strategy("rust", Tier::Starter).kind, StrategyKind::Budget);
        assert_eq!(
            select_strategy("compare rust and go", Tier::Starter).kind,
            StrategyKind::Standard
        );
        assert_eq!(select_strategy(QUERIES[2], Tier::Starter).kind, StrategyKind::Standard);
    }

    #[test]
    fn test_standard_needs_complex_and_very_long_for_richest() {
        assert_eq!(
            select_strategy("compare rust and go", Tier::Standard).kind,
            StrategyKind::Standard
        );
        assert_eq!(select_strategy(QUERIES[2], Tier::Standard).kind, StrategyKind::Serpapi);
        assert_eq!(select_strategy("rust", Tier::Standard).kind, StrategyKind::Budget);
    }

    #[test]
    fn test_selection_returns_same_reference() {
        let a = select_strategy("news today", Tier::Pro);
        let b = select_strategy("news today", Tier::Pro);
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_markers_match_whole_words() {
        let traits = QueryTraits::analyze("knowledge about snow");
        assert!(!traits.recent);
        assert!(QueryTraits::analyze("What's new this week?").recent);
    }

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("Standard".parse::<StrategyKind>(), Ok(StrategyKind::Standard));
        assert_eq!("realtime".parse::<StrategyKind>(), Ok(StrategyKind::Serpapi));
        assert!("turbo".parse::<StrategyKind>().is_err());
        for kind in StrategyKind::ALL {
            assert_eq!(kind.strategy().kind, kind);
        }
    }
}
