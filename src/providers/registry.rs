//! Provider registry built from settings

use super::brave::Brave;
use super::duckduckgo::DuckDuckGo;
use super::serpapi::SerpApi;
use super::serper::Serper;
use super::traits::{Engine, HttpProvider, ProviderTier, SearchProvider};
use super::wikipedia::Wikipedia;
use crate::config::{timeout_secs, ProviderConfig, Settings};
use crate::network::HttpClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Registry of configured search providers
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn SearchProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any with the same name
    pub fn register(&mut self, provider: Arc<dyn SearchProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SearchProvider>> {
        self.providers.get(name)
    }

    /// Providers of one tier, most authoritative first
    pub fn by_tier(&self, tier: ProviderTier) -> Vec<Arc<dyn SearchProvider>> {
        let mut selected: Vec<_> = self
            .providers
            .values()
            .filter(|p| p.tier() == tier)
            .cloned()
            .collect();
        selected.sort_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| a.name().cmp(b.name()))
        });
        selected
    }

    pub fn free(&self) -> Vec<Arc<dyn SearchProvider>> {
        self.by_tier(ProviderTier::Free)
    }

    pub fn paid(&self) -> Vec<Arc<dyn SearchProvider>> {
        self.by_tier(ProviderTier::Paid)
    }

    pub fn premium(&self) -> Vec<Arc<dyn SearchProvider>> {
        self.by_tier(ProviderTier::Premium)
    }

    /// Get all provider names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Build adapters for every enabled provider in `settings`.
    ///
    /// Paid providers without an API key and unknown adapters are skipped.
    pub fn from_settings(settings: &Settings, client: HttpClient) -> Self {
        let mut registry = Self::new();

        for config in settings.enabled_providers() {
            match build_provider(config, client.clone()) {
                Some(provider) => {
                    info!(
                        "Registered provider {} ({:?}, priority {})",
                        provider.name(),
                        provider.tier(),
                        provider.priority()
                    );
                    registry.register(provider);
                }
                None => continue,
            }
        }

        registry
    }
}

fn build_provider(config: &ProviderConfig, client: HttpClient) -> Option<Arc<dyn SearchProvider>> {
    let key = config.api_key();
    let base = config.base_url.as_deref();

    let needs_key = matches!(config.adapter(), "serper" | "serpapi" | "brave");
    if needs_key && key.is_empty() {
        warn!("Provider {} has no API key, skipping", config.name);
        return None;
    }

    let provider: Arc<dyn SearchProvider> = match config.adapter() {
        "serper" => {
            let engine = match base {
                Some(url) => Serper::with_base_url(url, key),
                None => Serper::new(key),
            };
            Arc::new(configure(engine, config, client))
        }
        "serpapi" => {
            let engine = match base {
                Some(url) => SerpApi::with_base_url(url, key),
                None => SerpApi::new(key),
            };
            let engine = engine.with_engine(config.upstream.as_deref().unwrap_or_default());
            Arc::new(configure(engine, config, client))
        }
        "brave" => {
            let engine = match base {
                Some(url) => Brave::with_base_url(url, key),
                None => Brave::new(key),
            };
            Arc::new(configure(engine, config, client))
        }
        "duckduckgo" => {
            let engine = base.map(DuckDuckGo::with_base_url).unwrap_or_default();
            Arc::new(configure(engine, config, client))
        }
        "wikipedia" => {
            let engine = base.map(Wikipedia::with_base_url).unwrap_or_default();
            Arc::new(configure(engine, config, client))
        }
        other => {
            warn!("Unknown provider adapter: {}", other);
            return None;
        }
    };

    Some(provider)
}

fn configure<E: Engine>(engine: E, config: &ProviderConfig, client: HttpClient) -> HttpProvider<E> {
    let mut provider = HttpProvider::new(engine, client)
        .with_priority(config.priority)
        .with_rate_limit(config.qps);
    if let Some(secs) = config.timeout {
        provider = provider.with_timeout(timeout_secs(secs));
    }
    provider
}
