//! Tournament engine server.
//!
//! Opens the configured document store, runs the auto-tournament scheduler
//! and serves the HTTP API until Ctrl+C.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use arena::{
    AutoTournamentScheduler, DocumentStore, JsonFileStore, TournamentEvent, TournamentManager,
    UserDirectory,
    db::Database,
};
use arena_server::{
    api,
    config::{Overrides, ServerConfig, StoreBackend},
    logging, metrics,
};
use pico_args::Arguments;
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tracing::info;

const HELP: &str = "\
Run the tournament engine server

USAGE:
  arena_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --store      BACKEND     Document store, file or postgres  [default: env STORE_BACKEND or file]
  --data-dir   PATH        Directory of the file store  [default: env DATA_DIR or ./data]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  STORE_BACKEND            file | postgres
  DATA_DIR                 File store directory
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Pool size (also DB_MIN_CONNECTIONS, DB_*_TIMEOUT)
  AUTO_TOURNAMENTS_ENABLED Run the auto-tournament scheduler [default: true]
  AUTO_TOURNAMENT_GAMES    Comma-separated game ids
  AUTO_TOURNAMENT_SIZES    Comma-separated bracket sizes
  ADMIN_TOKEN              Bearer token for /api/v1/admin routes
  METRICS_BIND             Prometheus exporter address
  RUST_LOG                 Log filter
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        store: pargs.opt_value_from_str("--store")?,
        data_dir: pargs.opt_value_from_str::<_, PathBuf>("--data-dir")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported at http://{addr}/metrics");
    }

    let (store, database): (Arc<dyn DocumentStore>, Option<Database>) = match &config.store {
        StoreBackend::File { data_dir } => {
            info!("Using file store in {}", data_dir.display());
            let store = JsonFileStore::open(data_dir)
                .await
                .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;
            (Arc::new(store), None)
        }
        StoreBackend::Postgres(db_config) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            let store = db.document_store();
            store.ensure_schema().await?;
            info!("Database connected successfully");
            (Arc::new(store), Some(db))
        }
    };

    let users = Arc::new(UserDirectory::new(store.clone()));
    let manager = Arc::new(TournamentManager::new(store, users));
    let scheduler = Arc::new(AutoTournamentScheduler::new(
        manager.clone(),
        config.scheduler.clone(),
    ));

    let event_task = tokio::spawn(observe_events(manager.subscribe()));

    if config.auto_tournaments_enabled {
        scheduler.start().await;
    } else {
        info!("Auto-tournament scheduler disabled");
    }
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set, admin routes are unauthenticated");
    }

    let state = api::AppState::new(manager, scheduler.clone(), config.admin_token.clone());
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    scheduler.stop().await;
    event_task.abort();
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Log lifecycle events and feed the metrics
async fn observe_events(mut events: Receiver<TournamentEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                logging::log_tournament_event(&event);
                metrics::record_event(&event);
            }
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed = missed, "Event observer lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C, running until killed");
        std::future::pending::<()>().await;
    }
}
