//! Serper (Google results API) provider

use super::traits::*;
use crate::error::ProviderError;
use crate::network::accept_json;
use crate::results::{KnowledgeGraph, ProviderResults, QuestionAnswer, SearchResult};
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://google.serper.dev";

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SerperResponse {
    organic: Vec<SerperOrganic>,
    related_searches: Vec<SerperRelated>,
    people_also_ask: Vec<SerperQuestion>,
    knowledge_graph: Option<SerperKnowledgeGraph>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerperOrganic {
    title: String,
    link: String,
    snippet: String,
    position: u32,
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerperRelated {
    query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerperQuestion {
    question: String,
    snippet: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerperKnowledgeGraph {
    title: String,
    description: String,
}

/// Primary paid web search
pub struct Serper {
    base_url: String,
    api_key: String,
}

impl Serper {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn normalize(&self, native: SerperResponse, max_results: usize) -> ProviderResults {
        let results = native
            .organic
            .into_iter()
            .map(|item| {
                let result = SearchResult::new(item.link, item.title, item.position)
                    .with_snippet(item.snippet)
                    .with_date(item.date);
                let host = result.hostname().unwrap_or_default();
                result.with_source(host)
            })
            .collect();

        ProviderResults {
            results: finalize_results(results, max_results),
            related_queries: native
                .related_searches
                .into_iter()
                .map(|r| r.query)
                .filter(|q| !q.is_empty())
                .collect(),
            people_also_ask: native
                .people_also_ask
                .into_iter()
                .filter(|q| !q.question.is_empty())
                .map(|q| QuestionAnswer {
                    question: q.question,
                    answer: q.snippet,
                })
                .collect(),
            knowledge_graph: native
                .knowledge_graph
                .filter(|kg| !kg.title.is_empty())
                .map(|kg| KnowledgeGraph {
                    title: kg.title,
                    description: kg.description,
                }),
        }
    }
}

impl Engine for Serper {
    fn name(&self) -> &str {
        "serper"
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Paid
    }

    fn request(&self, query: &str, options: &SearchOptions) -> Result<EngineRequest, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let body = json!({
            "q": query,
            "num": options.max_results,
            "gl": options.locale,
            "hl": options.language,
        });

        Ok(EngineRequest::post(format!("{}/search", self.base_url))
            .header("X-API-KEY", self.api_key.as_str())
            .header("Accept", accept_json())
            .json(body))
    }

    fn response(
        &self,
        response: EngineResponse,
        options: &SearchOptions,
    ) -> Result<ProviderResults, ProviderError> {
        response.ensure_success()?;
        let native: SerperResponse = response.json()?;
        Ok(self.normalize(native, options.max_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ok_response(text: &str) -> EngineResponse {
        EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: text.to_string(),
            url: "https://google.serper.dev/search".to_string(),
        }
    }

    #[test]
    fn test_serper_request() {
        let serper = Serper::new("key");
        let request = serper.request("rust", &SearchOptions::default()).unwrap();
        assert!(request.url.ends_with("/search"));
        assert_eq!(request.headers.get("X-API-KEY").map(String::as_str), Some("key"));
    }

    #[test]
    fn test_serper_requires_key() {
        let serper = Serper::new("");
        assert_eq!(
            serper.request("rust", &SearchOptions::default()).unwrap_err(),
            ProviderError::MissingApiKey
        );
    }

    #[test]
    fn test_serper_normalizes_missing_fields() {
        let serper = Serper::new("key");
        let body = r#"{
            "organic": [
                {"title": "Rust", "link": "https://www.rust-lang.org/", "position": 1},
                {"title": "No link"}
            ],
            "relatedSearches": [{"query": "rust book"}],
            "peopleAlsoAsk": [{"question": "Is Rust fast?"}],
            "knowledgeGraph": {"title": "Rust"}
        }"#;

        let output = serper
            .response(ok_response(body), &SearchOptions::default())
            .unwrap();

        assert_eq!(output.results.len(), 1);
        assert_eq!(output.results[0].snippet, "");
        assert_eq!(output.results[0].source.as_deref(), Some("rust-lang.org"));
        assert_eq!(output.related_queries, vec!["rust book"]);
        assert_eq!(output.people_also_ask[0].answer, "");
        assert_eq!(output.knowledge_graph.unwrap().description, "");
    }

    #[test]
    fn test_serper_empty_body_fields() {
        let serper = Serper::new("key");
        let output = serper
            .response(ok_response("{}"), &SearchOptions::default())
            .unwrap();
        assert!(output.is_empty());
        assert!(output.knowledge_graph.is_none());
    }
}
