//! Result container for merging and deduplicating provider output

use super::types::*;
use std::collections::{HashMap, HashSet};

/// Accumulates provider output in call order
///
/// Results keep the first occurrence of each link; later duplicates are only
/// visible through [`ResultContainer::all_results`].
#[derive(Debug, Default)]
pub struct ResultContainer {
    /// Every result from every provider, duplicates included
    all_results: Vec<ProviderResult>,
    /// Deduplicated results with their provider priority
    unique: Vec<(u32, SearchResult)>,
    seen_links: HashSet<String>,
    related_queries: Vec<String>,
    seen_related: HashSet<String>,
    people_also_ask: Vec<QuestionAnswer>,
    knowledge_graph: Option<KnowledgeGraph>,
    /// Result count per provider, 0 for failures
    provider_stats: HashMap<String, usize>,
    failed_providers: Vec<String>,
}

impl ResultContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one provider's output
    pub fn add_provider_results(&mut self, provider: &str, priority: u32, output: ProviderResults) {
        let count = output.results.iter().filter(|r| !r.link.is_empty()).count();
        self.provider_stats.insert(provider.to_string(), count);

        for result in output.results {
            if result.link.is_empty() {
                continue;
            }
            self.all_results.push(ProviderResult {
                provider: provider.to_string(),
                result: result.clone(),
            });
            if self.seen_links.insert(result.link.clone()) {
                self.unique.push((priority, result));
            }
        }

        for query in output.related_queries {
            let key = query.trim().to_lowercase();
            if !key.is_empty() && self.seen_related.insert(key) {
                self.related_queries.push(query);
            }
        }

        for qa in output.people_also_ask {
            if !self.people_also_ask.iter().any(|q| q.question == qa.question) {
                self.people_also_ask.push(qa);
            }
        }

        if self.knowledge_graph.is_none() {
            self.knowledge_graph = output.knowledge_graph;
        }
    }

    /// Record a provider that failed or timed out
    pub fn add_failure(&mut self, provider: &str) {
        self.provider_stats.insert(provider.to_string(), 0);
        self.failed_providers.push(provider.to_string());
    }

    pub fn all_results(&self) -> &[ProviderResult] {
        &self.all_results
    }

    /// Unique results ordered by (provider priority, original position)
    pub fn ranked_results(&self, limit: usize) -> Vec<SearchResult> {
        let mut ranked = self.unique.clone();
        // Stable sort keeps call order for full ties
        ranked.sort_by_key(|(priority, result)| (*priority, result.position));
        ranked.into_iter().take(limit).map(|(_, r)| r).collect()
    }

    pub fn provider_stats(&self) -> &HashMap<String, usize> {
        &self.provider_stats
    }

    pub fn failed_providers(&self) -> &[String] {
        &self.failed_providers
    }

    /// Consume the container, keeping the top `limit` ranked results
    pub fn finish(self, limit: usize) -> AggregatedResults {
        let best_results = self.ranked_results(limit);
        let total_unique_sources = self.unique.len();
        AggregatedResults {
            all_results: self.all_results,
            best_results,
            provider_stats: self.provider_stats,
            total_unique_sources,
            related_queries: self.related_queries,
            people_also_ask: self.people_also_ask,
            knowledge_graph: self.knowledge_graph,
            failed_providers: self.failed_providers,
        }
    }
}

/// Output of a multi-provider fan-out
#[derive(Debug, Clone, Default)]
pub struct AggregatedResults {
    pub all_results: Vec<ProviderResult>,
    pub best_results: Vec<SearchResult>,
    pub provider_stats: HashMap<String, usize>,
    pub total_unique_sources: usize,
    pub related_queries: Vec<String>,
    pub people_also_ask: Vec<QuestionAnswer>,
    pub knowledge_graph: Option<KnowledgeGraph>,
    pub failed_providers: Vec<String>,
}

impl AggregatedResults {
    /// True when at least one provider was called and every one failed
    pub fn all_failed(&self) -> bool {
        !self.provider_stats.is_empty() && self.failed_providers.len() == self.provider_stats.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(link: &str, position: u32) -> SearchResult {
        SearchResult::new(link, format!("Title {}", position), position)
    }

    #[test]
    fn test_result_deduplication_keeps_first() {
        let mut container = ResultContainer::new();
        container.add_provider_results(
            "serper",
            2,
            ProviderResults::with_results(vec![
                result("https://example.com", 1).with_snippet("first"),
            ]),
        );
        container.add_provider_results(
            "duckduckgo",
            5,
            ProviderResults::with_results(vec![
                result("https://example.com", 1).with_snippet("second"),
                result("https://other.com", 2),
            ]),
        );

        let aggregated = container.finish(8);
        assert_eq!(aggregated.total_unique_sources, 2);
        assert_eq!(aggregated.all_results.len(), 3);
        assert_eq!(aggregated.best_results[0].snippet, "first");
    }

    #[test]
    fn test_result_ordering_by_priority_then_position() {
        let mut container = ResultContainer::new();
        container.add_provider_results(
            "duckduckgo",
            5,
            ProviderResults::with_results(vec![result("https://ddg-1.com", 1)]),
        );
        container.add_provider_results(
            "serper",
            2,
            ProviderResults::with_results(vec![
                result("https://serper-2.com", 2),
                result("https://serper-1.com", 1),
            ]),
        );

        let links: Vec<_> = container
            .ranked_results(8)
            .into_iter()
            .map(|r| r.link)
            .collect();
        assert_eq!(
            links,
            vec!["https://serper-1.com", "https://serper-2.com", "https://ddg-1.com"]
        );
    }

    #[test]
    fn test_truncates_to_limit() {
        let mut container = ResultContainer::new();
        let results = (1..=12)
            .map(|i| result(&format!("https://site{}.com", i), i))
            .collect();
        container.add_provider_results("serper", 1, ProviderResults::with_results(results));
        assert_eq!(container.finish(8).best_results.len(), 8);
    }

    #[test]
    fn test_failures_count_as_zero() {
        let mut container = ResultContainer::new();
        container.add_failure("brave");
        let aggregated = container.finish(8);
        assert_eq!(aggregated.provider_stats.get("brave"), Some(&0));
        assert!(aggregated.all_failed());
    }

    #[test]
    fn test_related_queries_deduplicated() {
        let mut container = ResultContainer::new();
        container.add_provider_results(
            "serper",
            1,
            ProviderResults {
                related_queries: vec!["Rust async".into(), "rust async ".into()],
                ..Default::default()
            },
        );
        assert_eq!(container.finish(8).related_queries, vec!["Rust async"]);
    }
}
