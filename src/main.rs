//! search-orchestrator server entry point

use anyhow::{anyhow, Result};
use search_orchestrator::{
    config,
    network::HttpClient,
    web::{create_router, AppState},
    Orchestrator,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config_path: Option<PathBuf> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "-V" | "--version" => {
                println!("search-orchestrator {}", search_orchestrator::VERSION);
                return Ok(());
            }
            "-c" | "--config" => {
                let path = args.next().ok_or_else(|| anyhow!("--config requires a path"))?;
                config_path = Some(PathBuf::from(path));
            }
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting search-orchestrator v{}", search_orchestrator::VERSION);

    let settings = config::load(config_path.as_deref())?;
    info!(
        "Tier {} with a monthly budget of ${:.2}",
        settings.billing.tier, settings.billing.monthly_budget_usd
    );

    let client = HttpClient::from_settings(&settings.outgoing)?;
    let orchestrator = Orchestrator::from_settings(&settings, client)?;
    info!("Loaded {} search providers", orchestrator.registry().len());

    let app = create_router(AppState::new(orchestrator));

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn print_usage() {
    println!(
        r#"
search-orchestrator v{}
Cost-aware search orchestration service

USAGE:
    search-orchestrator [OPTIONS]

OPTIONS:
    -c, --config <FILE>    Path to configuration file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    SEARCH_ORCH_SETTINGS_PATH       Path to settings.yml
    SEARCH_ORCH_PORT                Server port
    SEARCH_ORCH_BIND_ADDRESS        Bind address
    SEARCH_ORCH_TIER                free | starter | standard | pro
    SEARCH_ORCH_MONTHLY_BUDGET      Monthly budget in USD
    SEARCH_ORCH_<PROVIDER>_API_KEY  API key of a provider, e.g. SEARCH_ORCH_SERPER_API_KEY
    SEARCH_ORCH_LLM_API_KEY         API key of the summarization LLM
    SEARCH_ORCH_LLM_BASE_URL        OpenAI-compatible endpoint
    SEARCH_ORCH_LLM_MODEL           Model name
    SEARCH_ORCH_FETCH_PROXY         Prefix for page fetches
    RUST_LOG                        Log filter, e.g. search_orchestrator=debug
"#,
        search_orchestrator::VERSION
    );
}
