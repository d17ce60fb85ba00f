//! Provider traits and types

use crate::error::ProviderError;
use crate::network::HttpClient;
use crate::results::{ProviderResults, SearchResult};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

/// Cost class of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTier {
    /// No API key, no per-query cost
    Free,
    /// Generic paid web-search API
    Paid,
    /// Realtime rich-data API
    Premium,
}

/// Device the results should be tailored for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Desktop,
    Mobile,
    Tablet,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
        }
    }
}

/// Geographic position for location-aware providers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Per-call search options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub max_results: usize,
    /// Country code, e.g. "us"
    pub locale: String,
    /// Language code, e.g. "en"
    pub language: String,
    pub device: Device,
    pub coordinates: Option<Coordinates>,
    /// Upper bound on one provider call
    pub timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 10,
            locale: "us".to_string(),
            language: "en".to_string(),
            device: Device::Desktop,
            coordinates: None,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
        }
    }
}

impl SearchOptions {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP request built by an engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub params: HashMap<String, String>,
    pub data: Option<RequestBody>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
        }
    }

    /// Create a POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Post,
            headers: HashMap::new(),
            params: HashMap::new(),
            data: None,
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add form data
    pub fn form(mut self, data: HashMap<String, String>) -> Self {
        self.data = Some(RequestBody::Form(data));
        self
    }

    /// Add JSON body
    pub fn json(mut self, data: serde_json::Value) -> Self {
        self.data = Some(RequestBody::Json(data));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Form(HashMap<String, String>),
    Json(serde_json::Value),
}

/// HTTP response handed back to the engine
#[derive(Debug)]
pub struct EngineResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail on non-2xx statuses
    pub fn ensure_success(&self) -> Result<(), ProviderError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(ProviderError::from_status(self.status))
        }
    }
}

/// Request/response half of an HTTP-backed provider
///
/// Engines are the only place that knows a provider's native wire shape.
pub trait Engine: Send + Sync {
    /// Engine name
    fn name(&self) -> &str;

    fn tier(&self) -> ProviderTier;

    /// Build the HTTP request for a search
    fn request(&self, query: &str, options: &SearchOptions) -> Result<EngineRequest, ProviderError>;

    /// Parse the HTTP response into normalized results
    fn response(
        &self,
        response: EngineResponse,
        options: &SearchOptions,
    ) -> Result<ProviderResults, ProviderError>;
}

/// A search backend as seen by the aggregator
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    fn tier(&self) -> ProviderTier;

    /// Ranking preference, lower is more authoritative
    fn priority(&self) -> u32 {
        100
    }

    /// Default bound on one call
    fn timeout(&self) -> Duration {
        Duration::from_secs(crate::DEFAULT_TIMEOUT)
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<ProviderResults, ProviderError>;
}

/// Adapter running an [`Engine`] over the shared HTTP client
///
/// Paid engines are rate limited, and retryable failures get one more attempt.
pub struct HttpProvider<E: Engine> {
    engine: E,
    client: HttpClient,
    priority: u32,
    timeout: Duration,
    max_retries: u32,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl<E: Engine> HttpProvider<E> {
    pub fn new(engine: E, client: HttpClient) -> Self {
        Self {
            engine,
            client,
            priority: 100,
            timeout: Duration::from_secs(crate::DEFAULT_TIMEOUT),
            max_retries: 1,
            limiter: None,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Limit outgoing calls to `qps` per second; zero disables the limit
    pub fn with_rate_limit(mut self, qps: u32) -> Self {
        self.limiter = NonZeroU32::new(qps).map(|n| RateLimiter::direct(Quota::per_second(n)));
        self
    }

    async fn attempt(&self, query: &str, options: &SearchOptions) -> Result<ProviderResults, ProviderError> {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }

        let request = self.engine.request(query, options)?;
        let timeout = options.timeout.min(self.timeout);
        let response = self.client.send(request, timeout).await?;

        self.engine.response(response, options)
    }
}

#[async_trait]
impl<E: Engine> SearchProvider for HttpProvider<E> {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn tier(&self) -> ProviderTier {
        self.engine.tier()
    }

    fn priority(&self) -> u32 {
        self.priority
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<ProviderResults, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.attempt(query, options).await {
                Ok(results) => {
                    debug!("{} returned {} results", self.name(), results.results.len());
                    return Ok(results);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("{} failed ({}), retrying", self.name(), e);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Drop link-less results, fill missing positions, truncate
pub fn finalize_results(results: Vec<SearchResult>, max_results: usize) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|r| !r.link.trim().is_empty())
        .take(max_results)
        .enumerate()
        .map(|(i, mut r)| {
            if r.position == 0 {
                r.position = (i + 1) as u32;
            }
            r
        })
        .collect()
}
