//! Page content fetching
//!
//! Retrieves the pages behind top results and reduces them to plain text.
//! Enrichment is best-effort: every failure turns into an empty string.

use crate::network::HttpClient;
use crate::results::SearchResult;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::join_all;
use moka::future::Cache;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on extracted text
pub const DEFAULT_CHAR_LIMIT: usize = 2000;

/// Elements whose text never reaches the output
const STRIPPED_TAGS: &[&str] = &[
    "head", "script", "style", "nav", "header", "footer", "aside", "noscript", "iframe", "svg",
    "form", "template",
];

/// URL-to-HTML fetch service
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP, optionally through a proxy prefix
pub struct HttpPageFetcher {
    client: HttpClient,
    proxy_url: Option<String>,
}

impl HttpPageFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            proxy_url: None,
        }
    }

    /// Route fetches through `{proxy}{encoded url}`
    pub fn with_proxy(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url.filter(|p| !p.is_empty());
        self
    }

    fn target(&self, url: &str) -> String {
        match self.proxy_url {
            Some(ref proxy) => format!("{}{}", proxy, urlencoding::encode(url)),
            None => url.to_string(),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get_page(&self.target(url)).await?;
        if !response.is_success() {
            return Err(anyhow!("HTTP error: {}", response.status));
        }
        Ok(response.text)
    }
}

/// Extract visible text from an HTML document, whitespace collapsed
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !STRIPPED_TAGS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

/// Truncate to at most `limit` characters
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Fetcher with a per-URL text cache
pub struct ContentFetcher {
    fetcher: Arc<dyn PageFetcher>,
    cache: Cache<String, String>,
    timeout: Duration,
}

impl ContentFetcher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_cache_ttl(fetcher, Duration::from_secs(600))
    }

    pub fn with_cache_ttl(fetcher: Arc<dyn PageFetcher>, ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).max_capacity(1000).build();
        Self {
            fetcher,
            cache,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Page text for `url`, at most `char_limit` characters; empty on failure
    pub async fn fetch_page_text(&self, url: &str, char_limit: usize) -> String {
        if let Some(text) = self.cache.get(url).await {
            return truncate_chars(&text, char_limit);
        }

        let html = match tokio::time::timeout(self.timeout, self.fetcher.fetch_html(url)).await {
            Ok(Ok(html)) => html,
            Ok(Err(e)) => {
                warn!("Failed to fetch {}: {}", url, e);
                return String::new();
            }
            Err(_) => {
                warn!("Timed out fetching {}", url);
                return String::new();
            }
        };

        let text = extract_text(&html);
        debug!("Extracted {} chars from {}", text.len(), url);
        if !text.is_empty() {
            self.cache.insert(url.to_string(), text.clone()).await;
        }
        truncate_chars(&text, char_limit)
    }

    /// Attach page text to the first `top_n` results, fetched concurrently
    pub async fn enrich(
        &self,
        mut results: Vec<SearchResult>,
        top_n: usize,
        char_limit: usize,
    ) -> Vec<SearchResult> {
        let n = top_n.min(results.len());
        let fetches = results[..n]
            .iter()
            .map(|r| self.fetch_page_text(&r.link, char_limit));
        let texts = join_all(fetches).await;

        for (result, text) in results.iter_mut().zip(texts) {
            if !text.is_empty() {
                result.content = Some(text);
            }
        }
        results
    }

    pub fn cached_pages(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
