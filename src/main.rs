use anyhow::{Context, Result};
use clap::Parser;
use rickmorty_gateway::{
    fixtures, router, store::SqliteUserStore, AppState, Config, RickMortyClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_PID_FILE: &str = "/tmp/rickmorty-gateway.pid";

#[derive(Parser, Debug)]
#[command(name = "rickmorty-gateway", version, about)]
struct Cli {
    /// Path to a .env file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(short, long)]
    verbose: bool,

    /// Run in the background
    #[arg(long)]
    daemon: bool,

    /// PID file used in daemon mode
    #[arg(long, default_value = DEFAULT_PID_FILE)]
    pid_file: PathBuf,

    /// Insert the demo accounts before serving
    #[arg(long)]
    seed_fixtures: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env_with_path(cli.config.clone())?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    config.debug |= cli.debug;
    config.verbose |= cli.verbose;

    if cli.daemon {
        daemonize::Daemonize::new()
            .pid_file(&cli.pid_file)
            .working_directory(std::env::current_dir()?)
            .start()
            .context("Failed to daemonize")?;
    }

    init_tracing(&config);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(serve(config, cli.seed_fixtures))
}

fn init_tracing(config: &Config) {
    let default_level = if config.verbose {
        "rickmorty_gateway=trace,tower_http=debug"
    } else if config.debug {
        "rickmorty_gateway=debug,tower_http=debug"
    } else {
        "rickmorty_gateway=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(config: Config, seed_fixtures: bool) -> Result<()> {
    let store = SqliteUserStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open user store at {}", config.database_url))?;
    store.migrate().await.context("Failed to create users table")?;

    if seed_fixtures {
        fixtures::seed_users(&store)
            .await
            .context("Failed to seed fixture users")?;
    }

    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;
    let api = RickMortyClient::new(http, config.api_base_url.clone());
    let app = router(AppState::new(api, Arc::new(store)));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Rick and Morty gateway listening on {}", addr);
    tracing::info!("Upstream API: {}", config.api_base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
