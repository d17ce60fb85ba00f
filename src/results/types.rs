//! Result type definitions

use serde::{Deserialize, Serialize};
use url::Url;

/// A single normalized search result
///
/// `link` is the identity used for deduplication across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the result
    pub title: String,
    /// Result URL
    pub link: String,
    /// Snippet text (empty when the provider has none)
    #[serde(default)]
    pub snippet: String,
    /// 1-based rank reported by the provider
    pub position: u32,
    /// Publisher or site name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Publication date as reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Fetched page text, bounded by the strategy's char limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl SearchResult {
    /// Create a new result
    pub fn new(link: impl Into<String>, title: impl Into<String>, position: u32) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: String::new(),
            position,
            source: None,
            date: None,
            content: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        if !source.is_empty() {
            self.source = Some(source);
        }
        self
    }

    pub fn with_date(mut self, date: Option<String>) -> Self {
        self.date = date.filter(|d| !d.is_empty());
        self
    }

    /// Get the hostname from the link
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.link)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
    }
}

/// A result tagged with the provider that returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub provider: String,
    #[serde(flatten)]
    pub result: SearchResult,
}

/// A "people also ask" entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

/// Knowledge panel summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Normalized output of one provider adapter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResults {
    pub results: Vec<SearchResult>,
    pub related_queries: Vec<String>,
    pub people_also_ask: Vec<QuestionAnswer>,
    pub knowledge_graph: Option<KnowledgeGraph>,
}

impl ProviderResults {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// The unit returned to callers and stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub analysis: String,
    pub sources: Vec<String>,
    /// Human-readable strategy and provider label
    pub method: String,
    pub cost_usd: f64,
    pub cached: bool,
    pub processing_time_ms: u64,
    /// Name of the strategy that produced this response
    pub strategy: String,
    #[serde(default)]
    pub related_queries: Vec<String>,
    #[serde(default)]
    pub people_also_ask: Vec<QuestionAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<KnowledgeGraph>,
    /// Set when the response came from the free fallback path
    #[serde(default)]
    pub degraded: bool,
}

impl SearchResponse {
    /// Build a response from ranked results; sources follow result order
    pub fn new(results: Vec<SearchResult>, analysis: String, method: String) -> Self {
        let sources = results.iter().map(|r| r.link.clone()).collect();
        Self {
            results,
            analysis,
            sources,
            method,
            cost_usd: 0.0,
            cached: false,
            processing_time_ms: 0,
            strategy: String::new(),
            related_queries: Vec::new(),
            people_also_ask: Vec::new(),
            knowledge_graph: None,
            degraded: false,
        }
    }

    /// A response with no results
    pub fn empty(method: impl Into<String>, analysis: impl Into<String>) -> Self {
        Self::new(Vec::new(), analysis.into(), method.into())
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_strips_www() {
        let result = SearchResult::new("https://www.example.com/page", "Example", 1);
        assert_eq!(result.hostname().as_deref(), Some("example.com"));
    }

    #[test]
    fn test_empty_optional_fields_stay_absent() {
        let result = SearchResult::new("https://example.com", "Example", 1)
            .with_source("")
            .with_date(Some(String::new()));
        assert!(result.source.is_none());
        assert!(result.date.is_none());
    }

    #[test]
    fn test_sources_follow_result_order() {
        let response = SearchResponse::new(
            vec![
                SearchResult::new("https://b.com", "B", 1),
                SearchResult::new("https://a.com", "A", 2),
            ],
            String::new(),
            "test".to_string(),
        );
        assert_eq!(response.sources, vec!["https://b.com", "https://a.com"]);
    }
}
