mod analyzer;
mod cache;
mod config;
mod fetcher;
mod model;
mod normalizer;
mod orchestrator;
mod service;
mod storage;
mod utils;

use cache::{MemoryTier, TieredCache};
use clap::Parser;
use config::{AppConfig, load_config};
use fetcher::{BlsClient, CensusClient, FccFipsResolver, NominatimGeocoder, build_http_client};
use model::{GeoType, ReportRequest};
use orchestrator::Orchestrator;
use service::ReportService;
use std::process::ExitCode;
use std::sync::Arc;
use storage::SqliteStorage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Labor-market report for a street address.
#[derive(Parser)]
#[command(name = "labor-pulse", version)]
struct Cli {
    /// Street address to report on.
    address: String,

    /// Geography of the primary view: tract, zip or county.
    #[arg(long, default_value = "tract")]
    geo_type: GeoType,

    /// Drop any cached report and recompute.
    #[arg(long)]
    flush_cache: bool,

    #[arg(long, default_value = "config.json")]
    config: String,

    /// Debug logging (RUST_LOG still wins).
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds every client and both cache tiers once.
fn build_service(config: &AppConfig) -> Result<ReportService, String> {
    let client = build_http_client(&config.user_agent, config.upstream_timeout())
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let bls = Arc::new(BlsClient::new(
        client.clone(),
        config.bls_base_url.clone(),
        config.bls_api_key.clone(),
    ));
    let census = Arc::new(CensusClient::new(
        client.clone(),
        config.census_base_url.clone(),
        config.census_api_key.clone(),
    ));
    let geocoder = Arc::new(NominatimGeocoder::new(client.clone(), config.geocoder_base_url.clone()));
    let fips = Arc::new(FccFipsResolver::new(client, config.fips_base_url.clone()));

    let storage = SqliteStorage::new(&config.database_path)
        .map_err(|e| format!("Failed to initialize storage: {}", e))?;
    let cache = TieredCache::new(
        Arc::new(MemoryTier::new(config.fast_cache_max_entries)),
        Arc::new(storage),
        config.fast_cache_ttl(),
    );

    let orchestrator = Orchestrator::new(bls, census, config.upstream_timeout(), config.acs_latest_year);
    Ok(ReportService::new(geocoder, fips, orchestrator, cache))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = match build_service(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let request = ReportRequest {
        address: cli.address,
        geo_type: cli.geo_type,
        flush_cache: cli.flush_cache,
    };

    match service.get_report(&request).await {
        Ok(response) => {
            info!("Report ready ({:?})", response.status);
            println!("{}", response.body);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Report failed: {}", e);
            match serde_json::to_string(&e.envelope()) {
                Ok(envelope) => println!("{}", envelope),
                Err(err) => error!("Failed to serialize error envelope: {}", err),
            }
            ExitCode::FAILURE
        }
    }
}
