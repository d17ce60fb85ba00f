//! Brave Search API provider

use super::traits::*;
use crate::error::ProviderError;
use crate::network::accept_json;
use crate::results::{ProviderResults, QuestionAnswer, SearchResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.search.brave.com";

/// Brave caps `count` at 20
const MAX_COUNT: usize = 20;

/// Brave highlights matches with <strong> tags
static HIGHLIGHT: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?strong>").expect("valid regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveResponse {
    web: BraveWeb,
    faq: BraveFaq,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveWeb {
    results: Vec<BraveWebResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveWebResult {
    title: String,
    url: String,
    description: String,
    age: Option<String>,
    profile: Option<BraveProfile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveProfile {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveFaq {
    results: Vec<BraveFaqEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BraveFaqEntry {
    question: String,
    answer: String,
}

/// Alternate paid web search
pub struct Brave {
    base_url: String,
    api_key: String,
}

impl Brave {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

fn clean(text: &str) -> String {
    HIGHLIGHT.replace_all(text, "").to_string()
}

impl Engine for Brave {
    fn name(&self) -> &str {
        "brave"
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Paid
    }

    fn request(&self, query: &str, options: &SearchOptions) -> Result<EngineRequest, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        Ok(EngineRequest::get(format!("{}/res/v1/web/search", self.base_url))
            .header("Accept", accept_json())
            .header("X-Subscription-Token", self.api_key.as_str())
            .param("q", query)
            .param("count", options.max_results.min(MAX_COUNT).to_string())
            .param("country", options.locale.as_str())
            .param("search_lang", options.language.as_str()))
    }

    fn response(
        &self,
        response: EngineResponse,
        options: &SearchOptions,
    ) -> Result<ProviderResults, ProviderError> {
        response.ensure_success()?;
        let native: BraveResponse = response.json()?;

        let results = native
            .web
            .results
            .into_iter()
            .map(|item| {
                let source = item.profile.map(|p| p.name).unwrap_or_default();
                SearchResult::new(item.url, clean(&item.title), 0)
                    .with_snippet(clean(&item.description))
                    .with_source(source)
                    .with_date(item.age)
            })
            .collect();

        let people_also_ask = native
            .faq
            .results
            .into_iter()
            .filter(|f| !f.question.is_empty())
            .map(|f| QuestionAnswer {
                question: clean(&f.question),
                answer: clean(&f.answer),
            })
            .collect();

        Ok(ProviderResults {
            results: finalize_results(results, options.max_results),
            people_also_ask,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_brave_request() {
        let brave = Brave::new("token");
        let options = SearchOptions::default().with_max_results(50);
        let request = brave.request("rust programming", &options).unwrap();

        assert!(request.url.contains("/res/v1/web/search"));
        assert_eq!(request.params.get("count").map(String::as_str), Some("20"));
        assert!(request.headers.contains_key("X-Subscription-Token"));
    }

    #[test]
    fn test_brave_positions_and_markup() {
        let brave = Brave::new("token");
        let body = r#"{"web": {"results": [
            {"title": "<strong>Rust</strong> Lang", "url": "https://rust-lang.org", "description": "A <strong>language</strong>"},
            {"title": "Docs", "url": "https://doc.rust-lang.org", "profile": {"name": "Rust Docs"}}
        ]}}"#;
        let response = EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: body.to_string(),
            url: String::new(),
        };

        let output = brave.response(response, &SearchOptions::default()).unwrap();
        assert_eq!(output.results[0].title, "Rust Lang");
        assert_eq!(output.results[0].snippet, "A language");
        assert_eq!(output.results[1].position, 2);
        assert_eq!(output.results[1].source.as_deref(), Some("Rust Docs"));
    }
}
