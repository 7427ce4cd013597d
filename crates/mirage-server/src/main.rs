//! Mirage server — application entry point.
//!
//! Exit codes: 0 normal shutdown, 1 bad configuration, 2 storage
//! unreachable at startup.

use mirage_db::{DbConfig, DbManager};
use mirage_server::{AppState, ServerConfig, build_router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let db_config = DbConfig {
        uri: config.storage_uri.clone(),
        username: config.storage_username.clone(),
        password: config.storage_password.clone(),
        ..DbConfig::default()
    };
    let db = match DbManager::connect(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "storage unreachable at startup");
            std::process::exit(2);
        }
    };
    if let Err(e) = mirage_db::run_migrations(db.client()).await {
        tracing::error!(error = %e, "schema migration failed");
        std::process::exit(2);
    }

    let state = match AppState::new(&db, &config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "invalid classifier configuration");
            std::process::exit(1);
        }
    };
    let app = build_router(state);

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.listen_addr, "cannot bind listen address");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %config.listen_addr, "Mirage server listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }

    tracing::info!("Mirage server stopped");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
