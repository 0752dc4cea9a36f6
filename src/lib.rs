//! HIV case-surveillance aggregation service.
//!
//! Serves the care-cascade Sankey diagram and its drill-down breakdown
//! tables from two pre-aggregated SQLite tables.

use tokio::net::TcpListener;
use tokio::signal;

// Public modules
pub mod api;
pub mod config;
pub mod database;
pub mod domains;
pub mod errors;
pub mod state;
pub mod validation;

// Private modules
mod db_migration;

#[cfg(test)]
mod test_support;

use crate::config::AppConfig;
use crate::errors::{ServiceError, ServiceResult};
use crate::state::AppState;

/// Build state from the config and serve until Ctrl+C or SIGTERM.
pub async fn start_server(config: AppConfig) -> ServiceResult<()> {
    log::info!("Initializing state...");
    let state = AppState::initialize(&config).await?;
    let pool = state.pool.clone();

    let cors = api::cors_layer(config.cors_allowed_origin.as_deref())?;
    let app = api::build_router(state, cors);

    let listener = TcpListener::bind(&config.bind_address).await.map_err(|e| {
        ServiceError::Configuration(format!("Cannot bind {}: {}", config.bind_address, e))
    })?;
    log::info!("Server running on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::Configuration(format!("Server error: {}", e)))?;

    log::info!("Server shutting down, closing database pool");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
