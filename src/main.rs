//! Stall-Scraper main entry point
//!
//! This is the command-line interface that loads the configuration and
//! serves the scrape API.

use clap::Parser;
use stall_scraper::config::{compute_config_hash, read_config, validate, Config};
use stall_scraper::crawler::coordinator_from_config;
use stall_scraper::server::{build_router, AppState};
use stall_scraper::storage::open_log;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Stall-Scraper: listing scraper with change tracking
///
/// Serves `GET /get-products`, which scrapes a range of listing pages,
/// reports how many products are new, updated or unchanged since they were
/// last seen, and appends every product to the configured log.
#[derive(Parser, Debug)]
#[command(name = "stall-scraper")]
#[command(version)]
#[command(about = "Listing scraper with change tracking", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the listen address from the config file
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Bearer token accepted by the API (overrides the config file)
    #[arg(long, env = "STALL_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Validate config and print the effective settings without serving
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_effective_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    let hash = compute_config_hash(&cli.config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.check {
        handle_check(&config);
        return Ok(());
    }

    serve(config).await
}

/// Reads the config file, applies command-line overrides, then validates
fn load_effective_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = read_config(&cli.config)?;

    if let Some(bind) = &cli.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(token) = &cli.api_token {
        config.server.api_token = token.clone();
    }

    validate(&config)?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("stall_scraper=info,warn"),
            1 => EnvFilter::new("stall_scraper=debug,tower_http=debug,info"),
            2 => EnvFilter::new("stall_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --check mode: shows the effective configuration
fn handle_check(config: &Config) {
    println!("=== Stall-Scraper Configuration ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);
    println!("  API token: {} characters", config.server.api_token.len());

    println!("\nFetcher:");
    println!("  Base URL: {}", config.fetcher.base_url);
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Timeout step: {}s", config.fetcher.timeout_step_secs);
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nCache:");
    println!("  Capacity: {}", config.cache.capacity);
    println!("  TTL: {}s", config.cache.ttl_secs);

    println!("\nOutput:");
    println!("  Log: {}", config.output.log_path);

    println!("\nSite rules:");
    println!("  Container: {}", config.site.container);
    println!("  Card path: {}", config.site.card_path);
    println!("  On card error: {:?}", config.site.on_card_error);
    let fields = [
        ("image", &config.site.fields.image),
        ("short-title", &config.site.fields.short_title),
        ("product-url", &config.site.fields.product_url),
        ("price", &config.site.fields.price),
    ];
    for (field, chain) in fields {
        println!("  {}:", field);
        for locator in chain {
            println!("    * {}", locator);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Opens the log, builds the router and serves until the process stops
async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let sink = open_log(Path::new(&config.output.log_path))?;
    let coordinator = coordinator_from_config(&config, sink);
    let state = AppState::new(coordinator, config.server.api_token.as_str());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
