//! Search orchestration façade
//!
//! [`Orchestrator::search`] resolves a strategy, consults the cache, applies
//! the budget gate, dispatches to providers and degrades to free providers on
//! any failure. It never returns an error.

mod state;

pub use state::{BillingProfile, OrchestratorState};

use crate::cache::{query_cache_key, CacheStats, SearchCache, DEFAULT_TTL_MINUTES};
use crate::config::{timeout_secs, Settings};
use crate::cost::{breakdown, estimate_cost};
use crate::error::SearchError;
use crate::fetch::{ContentFetcher, HttpPageFetcher, DEFAULT_CHAR_LIMIT};
use crate::llm::{LlmService, OpenAiCompatible};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::providers::{ProviderRegistry, SearchOptions, SearchProvider};
use crate::results::{AggregatedResults, SearchResponse, SearchResult};
use crate::search::{emit, Aggregator, ProgressSink, SearchProgress};
use crate::strategy::{select_strategy, ProviderSet, Strategy, StrategyKind, QUICK};
use crate::summarize::{format_listing, Summarizer};
use anyhow::Result;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const METHOD_BUDGET_LIMIT: &str = "Free search (budget limit)";
pub const METHOD_FALLBACK: &str = "Free search (fallback)";

const NO_FREE_PROVIDERS: &str = "Search is temporarily unavailable: no free search providers are configured.";
const ALL_PROVIDERS_FAILED: &str =
    "All search providers are currently unavailable. Please try again in a moment.";

pub struct Orchestrator {
    registry: ProviderRegistry,
    aggregator: Aggregator,
    cache: Arc<SearchCache>,
    content: Option<Arc<ContentFetcher>>,
    summarizer: Option<Summarizer>,
    metrics: Arc<Metrics>,
    state: RwLock<OrchestratorState>,
    options: SearchOptions,
    cache_ttl_minutes: i64,
    fetch_top_pages: usize,
    default_char_limit: usize,
}

impl Orchestrator {
    pub fn new(registry: ProviderRegistry, billing: BillingProfile) -> Self {
        let metrics = Arc::new(Metrics::new());
        Self {
            registry,
            aggregator: Aggregator::new().with_metrics(metrics.clone()),
            cache: Arc::new(SearchCache::default()),
            content: None,
            summarizer: None,
            metrics,
            state: RwLock::new(OrchestratorState::new(billing)),
            options: SearchOptions::default(),
            cache_ttl_minutes: DEFAULT_TTL_MINUTES,
            fetch_top_pages: 3,
            default_char_limit: DEFAULT_CHAR_LIMIT,
        }
    }

    /// Wire every collaborator from settings
    pub fn from_settings(settings: &Settings, client: HttpClient) -> Result<Self> {
        let registry = ProviderRegistry::from_settings(settings, client.clone());

        let page_fetcher = HttpPageFetcher::new(client).with_proxy(settings.fetch.proxy_url.clone());
        let content = ContentFetcher::with_cache_ttl(
            Arc::new(page_fetcher),
            Duration::from_secs(settings.cache.page_ttl_secs),
        )
        .with_timeout(timeout_secs(settings.fetch.timeout));

        let mut orchestrator = Self::new(registry, BillingProfile::from(&settings.billing))
            .with_cache(Arc::new(SearchCache::new(settings.cache.soft_cap)))
            .with_cache_ttl(settings.cache.ttl_minutes)
            .with_content_fetcher(Arc::new(content))
            .with_fetch_limits(settings.fetch.top_pages, settings.fetch.char_limit)
            .with_options(settings.search.options())
            .with_parallel_providers(settings.search.parallel);

        if settings.llm.api_key.is_some() {
            let llm = OpenAiCompatible::from_settings(&settings.llm)?;
            orchestrator = orchestrator.with_summarizer(
                Summarizer::new(Arc::new(llm))
                    .with_temperature(settings.llm.temperature)
                    .with_max_tokens(settings.llm.max_tokens),
            );
        } else {
            info!("No LLM API key configured, analysis falls back to result listings");
        }

        Ok(orchestrator)
    }

    pub fn with_cache(mut self, cache: Arc<SearchCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_cache_ttl(mut self, minutes: i64) -> Self {
        self.cache_ttl_minutes = minutes;
        self
    }

    pub fn with_content_fetcher(mut self, content: Arc<ContentFetcher>) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_llm(self, llm: Arc<dyn LlmService>) -> Self {
        self.with_summarizer(Summarizer::new(llm))
    }

    pub fn with_summarizer(mut self, summarizer: Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.aggregator = self.aggregator.with_metrics(metrics.clone());
        self.metrics = metrics;
        self
    }

    /// Call the providers of one fan-out concurrently
    pub fn with_parallel_providers(mut self, parallel: bool) -> Self {
        self.aggregator = self.aggregator.with_parallel(parallel);
        self
    }

    /// Base options; strategies override result count and timeout
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_fetch_limits(mut self, top_pages: usize, default_char_limit: usize) -> Self {
        self.fetch_top_pages = top_pages;
        self.default_char_limit = default_char_limit;
        self
    }

    /// Run one search. Every failure resolves to a (possibly degraded) response.
    pub async fn search(
        &self,
        query: &str,
        forced: Option<StrategyKind>,
        progress: Option<&ProgressSink>,
    ) -> SearchResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!("search", %request_id);
        self.run(query, forced, progress).instrument(span).await
    }

    async fn run(&self, query: &str, forced: Option<StrategyKind>, progress: Option<&ProgressSink>) -> SearchResponse {
        let start = Instant::now();

        if query.trim().is_empty() {
            debug!("Empty query, nothing to search");
            return SearchResponse::empty("No search", "Please enter a search query.");
        }

        let state = self.state();
        let strategy = match forced {
            Some(kind) => kind.strategy(),
            None => select_strategy(query, state.tier),
        };
        info!("Query '{}' using {} strategy (tier {})", query, strategy.name, state.tier);
        emit(progress, SearchProgress::StrategySelected { strategy: strategy.name });

        let key = query_cache_key(query, strategy);
        if strategy.caching_enabled {
            if let Some(mut hit) = self.cache.get(&key) {
                info!("Cache hit for '{}'", query);
                self.metrics.inc_cache_hit();
                hit.cached = true;
                hit.processing_time_ms = elapsed_ms(start);
                emit(progress, SearchProgress::CacheHit);
                emit(progress, SearchProgress::Completed { results: hit.result_count() });
                return hit;
            }
            debug!("Cache miss for '{}'", query);
        }

        let cost = estimate_cost(strategy, 1, strategy.uses_premium_provider());
        if state.over_budget(cost) {
            warn!(
                "Budget exceeded ({} searches x ${:.4} > ${:.2}), downgrading to free search",
                state.monthly_search_count, cost, state.monthly_budget_usd
            );
            self.metrics.inc_budget_downgrade();
            emit(progress, SearchProgress::BudgetExceeded);
            return self.free_path(query, METHOD_BUDGET_LIMIT, start, progress).await;
        }

        let Dispatched { mut response, summarized } = match self.dispatch(query, strategy, progress).await {
            Ok(dispatched) => dispatched,
            Err(e) => {
                warn!("{} path failed: {}, falling back to free search", strategy.name, e);
                self.metrics.inc_fallback();
                emit(progress, SearchProgress::FallingBack);
                return self.free_path(query, METHOD_FALLBACK, start, progress).await;
            }
        };

        // No summary produced, no AI line item
        let mut charged = breakdown(strategy, 1, strategy.uses_premium_provider());
        if !summarized {
            charged.ai_usd = 0.0;
        }

        response.strategy = strategy.name.to_string();
        response.cost_usd = if response.degraded { 0.0 } else { charged.total() };
        response.processing_time_ms = elapsed_ms(start);

        if !response.degraded {
            if strategy.caching_enabled && !response.results.is_empty() {
                self.cache.set(&key, &response, self.cache_ttl_minutes);
            }
            self.increment_search_count();
            self.metrics.inc_search();
        }

        emit(progress, SearchProgress::Completed { results: response.result_count() });
        response
    }

    async fn dispatch(
        &self,
        query: &str,
        strategy: &'static Strategy,
        progress: Option<&ProgressSink>,
    ) -> Result<Dispatched, SearchError> {
        let options = self.options_for(strategy);

        if strategy.provider_set == ProviderSet::Premium {
            let providers = self.registry.premium();
            if providers.is_empty() {
                return Err(SearchError::NoProviders("premium"));
            }
            let aggregated = self.fan_out(query, &providers, &options, progress).await?;
            let results = top(&aggregated, strategy.max_results);
            let (analysis, summarized) = if strategy.use_ai_analysis {
                self.analyze(query, &results, progress).await
            } else {
                (format_listing(query, &results), false)
            };
            let method = label("Realtime search", &providers, &aggregated, summarized);
            return Ok(Dispatched::new(build_response(results, analysis, method, aggregated), summarized));
        }

        if strategy.use_ai_analysis {
            let mut providers = self.registry.paid();
            if providers.is_empty() {
                return Err(SearchError::NoProviders("paid"));
            }
            if strategy.use_free_providers {
                providers.extend(self.registry.free());
            }
            let aggregated = self.fan_out(query, &providers, &options, progress).await?;
            let mut results = top(&aggregated, strategy.max_results);

            if strategy.fetch_content {
                results = self.enrich(results, strategy, progress).await;
            }

            let (analysis, summarized) = self.analyze(query, &results, progress).await;
            let method = label("AI search", &providers, &aggregated, summarized);
            return Ok(Dispatched::new(build_response(results, analysis, method, aggregated), summarized));
        }

        if strategy.use_free_providers {
            let providers = self.registry.free();
            if providers.is_empty() {
                return Err(SearchError::NoProviders("free"));
            }
            let aggregated = self.aggregator.aggregate(query, &providers, &options, progress).await;
            if aggregated.all_failed() {
                let mut response = SearchResponse::empty(METHOD_FALLBACK, ALL_PROVIDERS_FAILED);
                response.degraded = true;
                return Ok(Dispatched::new(response, false));
            }
            let results = top(&aggregated, strategy.max_results);
            let analysis = format_listing(query, &results);
            let method = label("Free search", &providers, &aggregated, false);
            return Ok(Dispatched::new(build_response(results, analysis, method, aggregated), false));
        }

        let providers = self.registry.paid();
        if providers.is_empty() {
            return Err(SearchError::NoProviders("paid"));
        }
        let aggregated = self.fan_out(query, &providers, &options, progress).await?;
        let results = top(&aggregated, strategy.max_results);
        let analysis = format_listing(query, &results);
        let method = label("Web search", &providers, &aggregated, false);
        Ok(Dispatched::new(build_response(results, analysis, method, aggregated), false))
    }

    /// Aggregate, failing when no provider answered
    async fn fan_out(
        &self,
        query: &str,
        providers: &[Arc<dyn SearchProvider>],
        options: &SearchOptions,
        progress: Option<&ProgressSink>,
    ) -> Result<AggregatedResults, SearchError> {
        let aggregated = self.aggregator.aggregate(query, providers, options, progress).await;
        if aggregated.all_failed() {
            return Err(SearchError::AllProvidersFailed {
                attempted: providers.len(),
            });
        }
        Ok(aggregated)
    }

    /// QUICK over free providers; never cached and never counted
    async fn free_path(
        &self,
        query: &str,
        method: &str,
        start: Instant,
        progress: Option<&ProgressSink>,
    ) -> SearchResponse {
        let providers = self.registry.free();

        let mut response = if providers.is_empty() {
            warn!("No free providers configured");
            SearchResponse::empty(method, NO_FREE_PROVIDERS)
        } else {
            let options = self.options_for(&QUICK);
            let aggregated = self.aggregator.aggregate(query, &providers, &options, progress).await;
            if aggregated.all_failed() {
                warn!("All free providers failed for '{}'", query);
                SearchResponse::empty(method, ALL_PROVIDERS_FAILED)
            } else {
                let results = top(&aggregated, QUICK.max_results);
                let analysis = format_listing(query, &results);
                build_response(results, analysis, method.to_string(), aggregated)
            }
        };

        response.strategy = QUICK.name.to_string();
        response.cost_usd = 0.0;
        response.degraded = true;
        response.processing_time_ms = elapsed_ms(start);

        emit(progress, SearchProgress::Completed { results: response.result_count() });
        response
    }

    async fn enrich(
        &self,
        results: Vec<SearchResult>,
        strategy: &Strategy,
        progress: Option<&ProgressSink>,
    ) -> Vec<SearchResult> {
        let Some(ref content) = self.content else {
            return results;
        };
        let pages = strategy.max_results.min(self.fetch_top_pages).min(results.len());
        if pages == 0 {
            return results;
        }
        let char_limit = if strategy.content_char_limit > 0 {
            strategy.content_char_limit
        } else {
            self.default_char_limit
        };

        emit(progress, SearchProgress::FetchingContent { pages });
        content.enrich(results, pages, char_limit).await
    }

    /// Analysis text, and whether the LLM wrote it
    async fn analyze(
        &self,
        query: &str,
        results: &[SearchResult],
        progress: Option<&ProgressSink>,
    ) -> (String, bool) {
        if let Some(ref summarizer) = self.summarizer {
            if !results.is_empty() {
                emit(progress, SearchProgress::Summarizing);
                if let Some(summary) = summarizer.summarize_results(query, results).await {
                    return (summary, true);
                }
            }
        }
        (format_listing(query, results), false)
    }

    fn options_for(&self, strategy: &Strategy) -> SearchOptions {
        self.options
            .clone()
            .with_max_results(strategy.max_results)
            .with_timeout(strategy.timeout())
    }

    fn state_mut(&self) -> std::sync::RwLockWriteGuard<'_, OrchestratorState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn increment_search_count(&self) {
        self.state_mut().monthly_search_count += 1;
    }

    /// Snapshot of tier, count and budget
    pub fn state(&self) -> OrchestratorState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Start a new billing cycle
    pub fn reset_monthly_stats(&self) {
        self.state_mut().monthly_search_count = 0;
        info!("Monthly search stats reset");
    }

    /// Replace tier and budget, keeping the search count
    pub fn set_billing(&self, billing: BillingProfile) {
        let mut state = self.state_mut();
        state.tier = billing.tier;
        state.monthly_budget_usd = billing.monthly_budget_usd;
    }

    /// Drop the cached responses of `query` under every strategy
    pub fn forget(&self, query: &str) {
        for kind in StrategyKind::ALL {
            self.cache.remove(&query_cache_key(query, kind.strategy()));
        }
        debug!("Forgot cached responses for '{}'", query);
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        if let Some(ref content) = self.content {
            content.clear();
        }
    }

    pub fn cache_size(&self) -> usize {
        self.cache.size()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Page texts held by the content fetcher
    pub fn cached_pages(&self) -> u64 {
        self.content.as_ref().map_or(0, |c| c.cached_pages())
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }
}

struct Dispatched {
    response: SearchResponse,
    /// The analysis came from the LLM
    summarized: bool,
}

impl Dispatched {
    fn new(response: SearchResponse, summarized: bool) -> Self {
        Self { response, summarized }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn top(aggregated: &AggregatedResults, max_results: usize) -> Vec<SearchResult> {
    aggregated.best_results.iter().take(max_results).cloned().collect()
}

/// "AI search (serper + duckduckgo)" style label over the providers that answered
fn label(
    prefix: &str,
    providers: &[Arc<dyn SearchProvider>],
    aggregated: &AggregatedResults,
    with_ai: bool,
) -> String {
    let answered: Vec<&str> = providers
        .iter()
        .map(|p| p.name())
        .filter(|name| !aggregated.failed_providers.iter().any(|f| f == name))
        .collect();
    let suffix = if with_ai { " + AI analysis" } else { "" };
    format!("{} ({}){}", prefix, answered.join(" + "), suffix)
}

fn build_response(
    results: Vec<SearchResult>,
    analysis: String,
    method: String,
    aggregated: AggregatedResults,
) -> SearchResponse {
    let mut response = SearchResponse::new(results, analysis, method);
    response.related_queries = aggregated.related_queries;
    response.people_also_ask = aggregated.people_also_ask;
    response.knowledge_graph = aggregated.knowledge_graph;
    response
}
