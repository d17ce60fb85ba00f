//! SerpApi provider
//!
//! The realtime rich-data engine. Results nest under `organic_results`, and the
//! response carries related searches, related questions and a knowledge graph.

use super::traits::*;
use crate::error::ProviderError;
use crate::network::accept_json;
use crate::results::{KnowledgeGraph, ProviderResults, QuestionAnswer, SearchResult};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerpApiResponse {
    organic_results: Vec<SerpApiOrganic>,
    related_searches: Vec<SerpApiRelated>,
    related_questions: Vec<SerpApiQuestion>,
    knowledge_graph: Option<SerpApiKnowledgeGraph>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerpApiOrganic {
    position: u32,
    title: String,
    link: String,
    snippet: String,
    source: Option<String>,
    displayed_link: Option<String>,
    date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerpApiRelated {
    query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerpApiQuestion {
    question: String,
    snippet: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerpApiKnowledgeGraph {
    title: String,
    description: String,
}

/// Realtime search through SerpApi
pub struct SerpApi {
    base_url: String,
    api_key: String,
    /// Upstream engine, e.g. "google"
    engine: String,
}

impl SerpApi {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            engine: "google".to_string(),
        }
    }

    /// Select the upstream engine; empty keeps "google"
    pub fn with_engine(mut self, engine: &str) -> Self {
        if !engine.is_empty() {
            self.engine = engine.to_string();
        }
        self
    }

    fn normalize(&self, native: SerpApiResponse, max_results: usize) -> ProviderResults {
        let results = native
            .organic_results
            .into_iter()
            .map(|item| {
                let source = item.source.or(item.displayed_link).unwrap_or_default();
                SearchResult::new(item.link, item.title, item.position)
                    .with_snippet(item.snippet)
                    .with_source(source)
                    .with_date(item.date)
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
                .related_questions
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

impl Engine for SerpApi {
    fn name(&self) -> &str {
        "serpapi"
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Premium
    }

    fn request(&self, query: &str, options: &SearchOptions) -> Result<EngineRequest, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let mut request = EngineRequest::get(format!("{}/search.json", self.base_url))
            .header("Accept", accept_json())
            .param("engine", self.engine.as_str())
            .param("q", query)
            .param("api_key", self.api_key.as_str())
            .param("num", options.max_results.to_string())
            .param("gl", options.locale.as_str())
            .param("hl", options.language.as_str())
            .param("device", options.device.as_str());

        if let Some(coords) = options.coordinates {
            request = request.param("ll", format!("@{},{},14z", coords.latitude, coords.longitude));
        }

        Ok(request)
    }

    fn response(
        &self,
        response: EngineResponse,
        options: &SearchOptions,
    ) -> Result<ProviderResults, ProviderError> {
        response.ensure_success()?;
        let native: SerpApiResponse = response.json()?;

        // SerpApi reports quota and key problems in-band
        if let Some(error) = native.error.as_deref() {
            if native.organic_results.is_empty() && !error.contains("hasn't returned any results") {
                return Err(ProviderError::Parse(error.to_string()));
            }
        }

        Ok(self.normalize(native, options.max_results))
    }
}
