//! # timer24hd: timer24h daemon
//!
//! Composition root that wires all adapters together and starts the scheduler.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the host, store and event bus (adapters)
//! - Construct the engine and schedule service, injecting adapters via port traits
//! - Build the axum router, injecting the schedule service
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use timer24h_adapter_http_axum::state::AppState;
use timer24h_adapter_storage_sqlite_sqlx::SqliteScheduleStore;
use timer24h_adapter_virtual::VirtualHost;
use timer24h_app::engine::ScheduleEngine;
use timer24h_app::event_bus::InProcessEventBus;
use timer24h_app::ports::SystemClock;
use timer24h_app::services::schedule_service::ScheduleService;
use timer24h_domain::slot::SlotClock;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = timer24h_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;
    let store = SqliteScheduleStore::new(db.pool().clone());

    // Host
    let entities = config.virtual_entities();
    if entities.is_empty() {
        tracing::warn!("virtual host starts without entities, every actuation will fail");
    }
    let host = Arc::new(VirtualHost::new(entities));

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Engine & service
    let slot_clock = SlotClock::new(config.default_zone()?);
    let engine = ScheduleEngine::new(
        Arc::clone(&host),
        Arc::clone(&host),
        Arc::clone(&event_bus),
        SystemClock,
        slot_clock,
    );
    let service = Arc::new(ScheduleService::new(store, engine));
    service.start().await;

    // HTTP
    let state = AppState::from_arcs(Arc::clone(&service), event_bus);
    let app = timer24h_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        default_timezone = %slot_clock.default_zone(),
        "timer24hd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    tracing::info!("timer24hd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
