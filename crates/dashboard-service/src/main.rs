//! Home dashboard HTTP service.
//!
//! Run with: `cargo run -p dashboard-service`

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use dashboard_service::{AppState, Config, api};
use dashboard_store::Store;

/// Home dashboard: serves temperature and humidity readings over HTTP.
#[derive(Parser, Debug)]
#[command(name = "dashboard-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Database path (overrides config).
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// IANA timezone for labels, e.g. "Europe/Rome" (overrides config).
    #[arg(short, long)]
    timezone: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dashboard_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(db_path) = args.database {
        config.storage.path = db_path;
    }
    if let Some(timezone) = args.timezone {
        config.dashboard.timezone = timezone;
    }
    config.validate()?;

    info!("Opening database at {:?}", config.storage.path);
    let store = Store::open_with_options(&config.storage.path, config.storage.store_options())?;

    let addr: SocketAddr = config.server.bind.parse()?;
    let state = AppState::new(store, config)?;

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
