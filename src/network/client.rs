//! HTTP client shared by provider adapters and the page fetcher

use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::{timeout_secs, OutgoingSettings, ProxySettings};
use crate::error::ProviderError;
use crate::providers::{EngineRequest, EngineResponse, HttpMethod, RequestBody};
use anyhow::Result;
use reqwest::{Client, Proxy, RequestBuilder, Response};
use std::time::Duration;
use tracing::debug;

/// Pooled reqwest client plus the outgoing defaults applied to every call
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
    browser_agent: String,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::from_settings(&OutgoingSettings::default())
    }

    pub fn from_settings(settings: &OutgoingSettings) -> Result<Self> {
        let timeout = timeout_secs(settings.request_timeout);
        let mut builder = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("search-orchestrator/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .gzip(true)
            .brotli(true);

        for proxy in proxies(&settings.proxies)? {
            builder = builder.proxy(proxy);
        }
        let inner = builder.build()?;

        Ok(Self {
            inner,
            timeout,
            browser_agent: generate_user_agent(),
        })
    }

    /// Send a provider request, classifying transport failures
    pub async fn send(&self, request: EngineRequest, timeout: Duration) -> Result<EngineResponse, ProviderError> {
        debug!("{:?} {}", request.method, request.url);
        let builder = self.prepare(request).timeout(timeout);

        let response = builder.send().await.map_err(|e| classify(e, timeout))?;
        read_response(response).await.map_err(|e| classify(e, timeout))
    }

    /// GET a web page with browser-like headers
    pub async fn get_page(&self, url: &str) -> Result<EngineResponse, ProviderError> {
        let request = EngineRequest::get(url)
            .header("User-Agent", self.browser_agent.clone())
            .header("Accept", accept_html());
        self.send(request, self.timeout).await
    }

    fn prepare(&self, request: EngineRequest) -> RequestBuilder {
        let mut builder = match request.method {
            HttpMethod::Get => self.inner.get(&request.url),
            HttpMethod::Post => self.inner.post(&request.url),
        }
        .header("Accept-Language", accept_language("en"));

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        match request.data {
            Some(RequestBody::Form(data)) => builder.form(&data),
            Some(RequestBody::Json(json)) => builder.json(&json),
            None => builder,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// User agent sent on page fetches
    pub fn browser_agent(&self) -> &str {
        &self.browser_agent
    }
}

/// `all` wins over the per-scheme proxies
fn proxies(settings: &ProxySettings) -> Result<Vec<Proxy>> {
    if let Some(ref all) = settings.all {
        return Ok(vec![Proxy::all(all)?]);
    }
    let mut proxies = Vec::new();
    if let Some(ref http) = settings.http {
        proxies.push(Proxy::http(http)?);
    }
    if let Some(ref https) = settings.https {
        proxies.push(Proxy::https(https)?);
    }
    Ok(proxies)
}

fn classify(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Network(err.to_string())
    }
}

async fn read_response(response: Response) -> Result<EngineResponse, reqwest::Error> {
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();

    Ok(EngineResponse {
        status,
        headers,
        text: response.text().await?,
        url,
    })
}
