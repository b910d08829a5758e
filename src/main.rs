//! Product service entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use product_api::api::{create_router, AppState};
use product_api::config::Config;
use product_api::error::{Result, ServiceError};
use product_api::metrics;
use product_api::store::{InMemoryProductStore, PgProductStore, ProductStore};
use product_api::utils::shutdown_signal;

/// Product catalogue HTTP service.
#[derive(Parser, Debug)]
#[command(name = "product-api")]
#[command(about = "Paginated product catalogue with transactional bulk creation")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// HTTP server port (overrides PORT).
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// PostgreSQL URL (overrides DATABASE_URL).
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.database_url.clone() {
        config.database_url = Some(url);
    }
    config.verbose |= args.verbose;

    // Initialize logging
    let filter = if config.verbose {
        EnvFilter::new("product_api=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    tracing_subscriber::registry()
        .with(config.log_json.then(|| fmt::layer().json()))
        .with((!config.log_json).then(fmt::layer))
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Serve) | None => cmd_serve(config).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("PRODUCT API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!();
    println!("  Listen address:   {}", config.bind_address());
    match config.redacted_database_url() {
        Some(url) => {
            println!("  Store:            PostgreSQL ({})", url);
            println!("  Max connections:  {}", config.database_max_connections);
            println!("  Auto migrate:     {}", config.database_auto_migrate);
        }
        None => println!("  Store:            in-memory (DATABASE_URL not set)"),
    }
    println!("  Log level:        {}", config.rust_log);
    println!("  JSON logs:        {}", config.log_json);

    Ok(())
}

/// Build the store and serve until a shutdown signal arrives.
async fn cmd_serve(config: Config) -> anyhow::Result<()> {
    config.validate().map_err(ServiceError::InvalidConfig)?;

    let store = build_store(&config).await?;
    let handle = metrics::install_prometheus().map_err(ServiceError::from)?;
    let state = AppState::new(store).with_metrics(handle);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await.map_err(ServiceError::Io)?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn ProductStore>> {
    match &config.database_url {
        Some(url) => {
            let store = PgProductStore::connect(url, config.database_max_connections).await?;
            if config.database_auto_migrate {
                store.ensure_schema().await?;
            }
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, products are kept in memory");
            Ok(Arc::new(InMemoryProductStore::new()))
        }
    }
}
