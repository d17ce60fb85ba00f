//! Provider adapters and the page fetcher against mocked HTTP services

use search_orchestrator::config::{ProviderConfig, SearchSettings, Settings};
use search_orchestrator::fetch::{ContentFetcher, HttpPageFetcher};
use search_orchestrator::network::HttpClient;
use search_orchestrator::providers::{
    duckduckgo::DuckDuckGo, serpapi::SerpApi, serper::Serper, wikipedia::Wikipedia, Device, HttpProvider,
    ProviderRegistry, SearchOptions, SearchProvider,
};
use search_orchestrator::{Orchestrator, ProviderError, StrategyKind};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::new().unwrap()
}

fn serper_body() -> serde_json::Value {
    json!({
        "organic": [
            {"title": "Rust", "link": "https://www.rust-lang.org/", "snippet": "Fast", "position": 1},
            {"title": "Book", "link": "https://doc.rust-lang.org/book/", "position": 2}
        ],
        "relatedSearches": [{"query": "rust tutorial"}],
        "peopleAlsoAsk": [{"question": "Is Rust hard?", "snippet": "A bit"}]
    })
}

#[tokio::test]
async fn serper_search_normalizes_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(header("X-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serper_body()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(Serper::with_base_url(server.uri(), "test-key"), client());
    let output = assert_ok!(provider.search("rust", &SearchOptions::default()).await);

    assert_eq!(output.results.len(), 2);
    assert_eq!(output.results[1].snippet, "");
    assert_eq!(output.related_queries, vec!["rust tutorial"]);
    assert_eq!(output.people_also_ask[0].answer, "A bit");
}

#[tokio::test]
async fn paid_provider_retries_once_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serper_body()))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(Serper::with_base_url(server.uri(), "k"), client());
    let output = assert_ok!(provider.search("rust", &SearchOptions::default()).await);
    assert_eq!(output.results.len(), 2);
}

#[tokio::test]
async fn rate_limited_provider_gives_up_after_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(Serper::with_base_url(server.uri(), "k"), client()).with_rate_limit(50);
    let err = assert_err!(provider.search("rust", &SearchOptions::default()).await);
    assert_eq!(err, ProviderError::RateLimited);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpProvider::new(SerpApi::with_base_url(server.uri(), "k"), client());
    let err = assert_err!(provider.search("rust", &SearchOptions::default()).await);
    assert_eq!(err, ProviderError::Status(401));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"organic_results": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let provider = HttpProvider::new(SerpApi::with_base_url(server.uri(), "k"), client()).with_max_retries(0);
    let options = SearchOptions::default().with_timeout(Duration::from_millis(50));
    let err = assert_err!(provider.search("rust", &options).await);
    assert!(matches!(err, ProviderError::Timeout(_)));
}

#[tokio::test]
async fn serpapi_sends_location_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("q", "coffee near me"))
        .and(query_param("device", "desktop"))
        .and(query_param("api_key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [{"position": 1, "title": "Cafe", "link": "https://cafe.example"}],
            "knowledge_graph": {"title": "Coffee", "description": "A drink"}
        })))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(SerpApi::with_base_url(server.uri(), "k"), client());
    let output = assert_ok!(provider.search("coffee near me", &SearchOptions::default()).await);
    assert_eq!(output.results[0].title, "Cafe");
    assert_eq!(output.knowledge_graph.unwrap().description, "A drink");
}

#[tokio::test]
async fn wikipedia_links_follow_answering_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("srsearch", "ferris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"search": [{"title": "Ferris wheel", "snippet": "A <span>ride</span>"}]}
        })))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(Wikipedia::with_base_url(server.uri()), client());
    let output = assert_ok!(provider.search("ferris", &SearchOptions::default()).await);
    assert_eq!(output.results[0].link, format!("{}/wiki/Ferris_wheel", server.uri()));
    assert_eq!(output.results[0].snippet, "A ride");
}

#[tokio::test]
async fn duckduckgo_parses_html_endpoint() {
    let server = MockServer::start().await;
    let page = r#"<div class="result"><a class="result__a" href="https://example.org/">Example</a>
        <a class="result__snippet">Example domain</a></div>"#;
    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains("q=example"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .mount(&server)
        .await;

    let provider = HttpProvider::new(DuckDuckGo::with_base_url(server.uri()), client());
    let output = assert_ok!(provider.search("example", &SearchOptions::default()).await);
    assert_eq!(output.results.len(), 1);
    assert_eq!(output.results[0].position, 1);
    assert_eq!(output.results[0].snippet, "Example domain");
}

#[tokio::test]
async fn registry_honours_base_url_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serper_body()))
        .mount(&server)
        .await;

    let settings = Settings {
        providers: vec![ProviderConfig {
            api_key: Some("k".to_string()),
            base_url: Some(server.uri()),
            ..ProviderConfig::new("serper", 1)
        }],
        ..Default::default()
    };

    let registry = ProviderRegistry::from_settings(&settings, client());
    let serper = registry.get("serper").cloned().unwrap();
    let output = assert_ok!(serper.search("rust", &SearchOptions::default()).await);
    assert_eq!(output.results.len(), 2);
}

#[tokio::test]
async fn configured_upstream_and_locale_reach_serpapi() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "bing"))
        .and(query_param("gl", "de"))
        .and(query_param("hl", "de"))
        .and(query_param("device", "mobile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": [{"position": 1, "title": "Kaffee", "link": "https://kaffee.example"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let settings = Settings {
        providers: vec![ProviderConfig {
            api_key: Some("k".to_string()),
            base_url: Some(server.uri()),
            upstream: Some("bing".to_string()),
            ..ProviderConfig::new("serpapi", 1)
        }],
        search: SearchSettings {
            locale: "de".to_string(),
            language: "de".to_string(),
            device: Device::Mobile,
            ..Default::default()
        },
        ..Default::default()
    };

    let orchestrator = assert_ok!(Orchestrator::from_settings(&settings, client()));
    let response = orchestrator.search("kaffee", Some(StrategyKind::Serpapi), None).await;
    assert!(!response.degraded);
    assert_eq!(response.method, "Realtime search (serpapi)");
    assert_eq!(response.results[0].link, "https://kaffee.example");
}

#[tokio::test]
async fn page_fetcher_extracts_text_and_swallows_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><nav>Home</nav><article><p>Ownership   rules</p></article>\
             <script>track()</script><footer>Footer</footer></body></html>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ContentFetcher::new(Arc::new(HttpPageFetcher::new(client())));

    let text = fetcher.fetch_page_text(&format!("{}/article", server.uri()), 2000).await;
    assert_eq!(text, "Ownership rules");

    let missing = fetcher.fetch_page_text(&format!("{}/gone", server.uri()), 2000).await;
    assert_eq!(missing, "");
}

#[tokio::test]
async fn page_fetcher_routes_through_proxy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxy"))
        .and(query_param("url", "https://example.com/a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>proxied</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let proxy = format!("{}/proxy?url=", server.uri());
    let fetcher = ContentFetcher::new(Arc::new(HttpPageFetcher::new(client()).with_proxy(Some(proxy))));

    assert_eq!(fetcher.fetch_page_text("https://example.com/a", 100).await, "proxied");
}
