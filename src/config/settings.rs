//! Settings structures for the search orchestrator

use crate::providers::{Coordinates, Device, SearchOptions};
use crate::strategy::Tier;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timeout from a seconds value in settings.
///
/// Clamped to 0.1s..=`MAX_TIMEOUT`; NaN and infinities use `DEFAULT_TIMEOUT`.
pub fn timeout_secs(secs: f64) -> Duration {
    if !secs.is_finite() {
        return Duration::from_secs(crate::DEFAULT_TIMEOUT);
    }
    Duration::from_secs_f64(secs.clamp(0.1, crate::MAX_TIMEOUT as f64))
}

/// Main settings structure, mirrors settings.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub providers: Vec<ProviderConfig>,
    pub cache: CacheSettings,
    pub billing: BillingSettings,
    pub fetch: FetchSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            providers: default_providers(),
            cache: CacheSettings::default(),
            billing: BillingSettings::default(),
            fetch: FetchSettings::default(),
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (SEARCH_ORCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any variable source
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("SEARCH_ORCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("SEARCH_ORCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("SEARCH_ORCH_TIER") {
            if let Ok(tier) = val.parse() {
                self.billing.tier = tier;
            }
        }
        if let Some(val) = var("SEARCH_ORCH_MONTHLY_BUDGET") {
            if let Ok(budget) = val.parse() {
                self.billing.monthly_budget_usd = budget;
            }
        }
        if let Some(val) = var("SEARCH_ORCH_LLM_API_KEY") {
            self.llm.api_key = Some(val);
        }
        if let Some(val) = var("SEARCH_ORCH_LLM_BASE_URL") {
            self.llm.base_url = val;
        }
        if let Some(val) = var("SEARCH_ORCH_LLM_MODEL") {
            self.llm.model = val;
        }
        if let Some(val) = var("SEARCH_ORCH_FETCH_PROXY") {
            self.fetch.proxy_url = Some(val);
        }

        // Per-provider keys, e.g. SEARCH_ORCH_SERPER_API_KEY
        for provider in &mut self.providers {
            let key = format!(
                "SEARCH_ORCH_{}_API_KEY",
                provider.name.to_uppercase().replace(['-', ' '], "_")
            );
            if let Some(val) = var(&key) {
                provider.api_key = Some(val);
            }
        }
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Get all enabled providers
    pub fn enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| !p.disabled).collect()
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 5.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Adapter to use; empty means same as `name`
    #[serde(alias = "engine")]
    pub kind: String,
    pub api_key: Option<String>,
    /// Override of the provider's API origin
    pub base_url: Option<String>,
    /// Lower ranks first when results are merged
    pub priority: u32,
    /// Per-call timeout in seconds
    pub timeout: Option<f64>,
    pub disabled: bool,
    /// Outgoing calls per second, 0 = unlimited
    pub qps: u32,
    /// Upstream engine for meta-APIs such as serpapi, e.g. "bing"
    pub upstream: Option<String>,
}

impl ProviderConfig {
    pub fn new(name: &str, priority: u32) -> Self {
        Self {
            name: name.to_string(),
            kind: name.to_string(),
            priority,
            ..Default::default()
        }
    }

    /// Adapter name, defaulting to the provider name
    pub fn adapter(&self) -> &str {
        if self.kind.is_empty() {
            &self.name
        } else {
            &self.kind
        }
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: String::new(),
            api_key: None,
            base_url: None,
            priority: 100,
            timeout: None,
            disabled: false,
            qps: 0,
            upstream: None,
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Entry count above which cleanup runs
    pub soft_cap: usize,
    pub ttl_minutes: i64,
    /// TTL of fetched page text in seconds
    pub page_ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            soft_cap: crate::cache::DEFAULT_SOFT_CAP,
            ttl_minutes: crate::cache::DEFAULT_TTL_MINUTES,
            page_ttl_secs: 600,
        }
    }
}

/// Subscription tier and spend ceiling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSettings {
    pub tier: Tier,
    pub monthly_budget_usd: f64,
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            tier: Tier::Free,
            monthly_budget_usd: 0.0,
        }
    }
}

/// Page content fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Fetch pages through `{proxy_url}{encoded url}` when set
    pub proxy_url: Option<String>,
    /// How many of the top results get their page fetched
    pub top_pages: usize,
    pub char_limit: usize,
    pub timeout: f64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            proxy_url: None,
            top_pages: 3,
            char_limit: 2000,
            timeout: 5.0,
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: f64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 1024,
            timeout: 30.0,
        }
    }
}

/// Defaults applied to every provider call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub locale: String,
    pub language: String,
    pub device: Device,
    pub coordinates: Option<Coordinates>,
    /// Query providers concurrently rather than in priority order
    pub parallel: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let options = SearchOptions::default();
        Self {
            locale: options.locale,
            language: options.language,
            device: options.device,
            coordinates: None,
            parallel: false,
        }
    }
}

impl SearchSettings {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            locale: self.locale.clone(),
            language: self.language.clone(),
            device: self.device,
            coordinates: self.coordinates,
            ..SearchOptions::default()
        }
    }
}

/// Default provider line-up, paid ones stay inactive until a key is set
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            qps: 5,
            ..ProviderConfig::new("serpapi", 1)
        },
        ProviderConfig {
            qps: 5,
            ..ProviderConfig::new("serper", 2)
        },
        ProviderConfig {
            qps: 1,
            ..ProviderConfig::new("brave", 3)
        },
        ProviderConfig::new("wikipedia", 4),
        ProviderConfig::new("duckduckgo", 5),
    ]
}
