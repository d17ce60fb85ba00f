//! Wikipedia search provider

use super::traits::*;
use crate::error::ProviderError;
use crate::network::accept_json;
use crate::results::{ProviderResults, SearchResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use url::Url;

/// Search snippets carry <span class="searchmatch"> highlights
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WikiResponse {
    query: WikiQuery,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WikiQuery {
    search: Vec<WikiPage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WikiPage {
    title: String,
    snippet: String,
    timestamp: Option<String>,
}

/// Free encyclopedic search over the MediaWiki API
pub struct Wikipedia {
    /// Template with a `{lang}` placeholder, or a fixed origin
    api_url: String,
    default_lang: String,
}

impl Wikipedia {
    pub fn new() -> Self {
        Self::with_base_url("https://{lang}.wikipedia.org")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_url: format!("{}/w/api.php", base_url.into().trim_end_matches('/')),
            default_lang: "en".to_string(),
        }
    }

    fn get_api_url(&self, lang: &str) -> String {
        let lang = if lang.is_empty() {
            &self.default_lang
        } else {
            lang.split('-').next().unwrap_or(&self.default_lang)
        };
        self.api_url.replace("{lang}", lang)
    }

    /// Article link on the wiki that answered
    fn article_url(origin: &str, title: &str) -> String {
        format!("{}/wiki/{}", origin, urlencoding::encode(&title.replace(' ', "_")))
    }
}

impl Default for Wikipedia {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Wikipedia {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Free
    }

    fn request(&self, query: &str, options: &SearchOptions) -> Result<EngineRequest, ProviderError> {
        Ok(EngineRequest::get(self.get_api_url(&options.language))
            .header("Accept", accept_json())
            .param("action", "query")
            .param("format", "json")
            .param("list", "search")
            .param("srsearch", query)
            .param("srlimit", options.max_results.to_string()))
    }

    fn response(
        &self,
        response: EngineResponse,
        options: &SearchOptions,
    ) -> Result<ProviderResults, ProviderError> {
        response.ensure_success()?;
        let native: WikiResponse = response.json()?;

        let origin = Url::parse(&response.url)
            .map(|u| u.origin().ascii_serialization())
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let results = native
            .query
            .search
            .into_iter()
            .filter(|page| !page.title.is_empty())
            .map(|page| {
                let snippet = MARKUP.replace_all(&page.snippet, "").to_string();
                SearchResult::new(Self::article_url(&origin, &page.title), page.title, 0)
                    .with_snippet(snippet)
                    .with_source("Wikipedia")
                    .with_date(page.timestamp)
            })
            .collect();

        Ok(ProviderResults::with_results(finalize_results(
            results,
            options.max_results,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_api_url_language() {
        let wiki = Wikipedia::new();
        assert_eq!(wiki.get_api_url("de-DE"), "https://de.wikipedia.org/w/api.php");
        assert_eq!(wiki.get_api_url(""), "https://en.wikipedia.org/w/api.php");
    }

    #[test]
    fn test_wikipedia_response() {
        let wiki = Wikipedia::new();
        let body = r#"{"query": {"search": [
            {"title": "Rust (programming language)", "snippet": "<span class=\"searchmatch\">Rust</span> is fast"}
        ]}}"#;
        let response = EngineResponse {
            status: 200,
            headers: HashMap::new(),
            text: body.to_string(),
            url: "https://en.wikipedia.org/w/api.php?action=query".to_string(),
        };

        let output = wiki.response(response, &SearchOptions::default()).unwrap();
        assert_eq!(output.results.len(), 1);
        assert_eq!(
            output.results[0].link,
            "https://en.wikipedia.org/wiki/Rust_%28programming_language%29"
        );
        assert_eq!(output.results[0].snippet, "Rust is fast");
        assert_eq!(output.results[0].position, 1);
    }
}
