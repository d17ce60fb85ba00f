//! DuckDuckGo HTML search provider

use super::traits::*;
use crate::error::ProviderError;
use crate::network::{accept_html, generate_user_agent};
use crate::results::{ProviderResults, SearchResult};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

static RESULT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.result").expect("valid selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("a.result__a").expect("valid selector"));
static SNIPPET: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result__snippet").expect("valid selector"));

/// Free web search over the no-JS HTML endpoint
pub struct DuckDuckGo {
    base_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn parse_html_results(&self, html: &str) -> Vec<SearchResult> {
        let document = Html::parse_document(html);
        let mut results = Vec::new();

        for element in document.select(&RESULT) {
            // Ads carry their own class on the same container
            if element.value().classes().any(|c| c == "result--ad") {
                continue;
            }

            let Some(anchor) = element.select(&TITLE).next() else {
                continue;
            };

            let title = anchor.text().collect::<String>().trim().to_string();
            let link = anchor
                .value()
                .attr("href")
                .map(decode_redirect)
                .unwrap_or_default();

            if title.is_empty() || link.is_empty() || link.contains("duckduckgo.com") {
                continue;
            }

            let snippet = element
                .select(&SNIPPET)
                .next()
                .map(|s| s.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let result = SearchResult::new(link, title, 0).with_snippet(snippet);
            let host = result.hostname().unwrap_or_default();
            results.push(result.with_source(host));
        }

        results
    }
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

/// Unwrap `//duckduckgo.com/l/?uddg=<target>` redirect links
fn decode_redirect(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };

    match Url::parse(&absolute) {
        Ok(url) if url.path().starts_with("/l/") => url
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or(absolute),
        Ok(_) => absolute,
        Err(_) => String::new(),
    }
}

impl Engine for DuckDuckGo {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn tier(&self) -> ProviderTier {
        ProviderTier::Free
    }

    fn request(&self, query: &str, options: &SearchOptions) -> Result<EngineRequest, ProviderError> {
        let mut form_data = HashMap::new();
        form_data.insert("q".to_string(), query.to_string());
        form_data.insert("b".to_string(), String::new());
        form_data.insert(
            "kl".to_string(),
            format!("{}-{}", options.locale, options.language),
        );

        Ok(EngineRequest::post(format!("{}/html/", self.base_url))
            .header("User-Agent", generate_user_agent())
            .header("Accept", accept_html())
            .form(form_data))
    }

    fn response(
        &self,
        response: EngineResponse,
        options: &SearchOptions,
    ) -> Result<ProviderResults, ProviderError> {
        response.ensure_success()?;
        let results = self.parse_html_results(&response.text);
        Ok(ProviderResults::with_results(finalize_results(
            results,
            options.max_results,
        )))
    }
}
