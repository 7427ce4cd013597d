//! Mirage server — the HTTP surface over the deception-telemetry
//! core: agent ingestion, the user-scoped query API, node lifecycle,
//! and agent bundle generation.

pub mod bundle;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod routes;
pub mod state;

use axum::Router;
use axum::routing::{get, patch, post};
use tower_http::cors::CorsLayer;

pub use config::{ConfigError, ServerConfig};
pub use state::AppState;

/// Assemble the full router. Exposed so tests can drive the service
/// without binding a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // User authentication.
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        // Node lifecycle.
        .route("/nodes", post(routes::nodes::create).get(routes::nodes::list))
        .route(
            "/nodes/{id}",
            get(routes::nodes::get_one)
                .patch(routes::nodes::update)
                .delete(routes::nodes::delete),
        )
        .route("/nodes/{id}/agent-download", get(routes::nodes::agent_download))
        // Decoys and honeytokens.
        .route("/decoys", get(routes::decoys::list_fleet))
        .route("/decoys/node/{id}", get(routes::decoys::list_node))
        .route(
            "/decoys/{id}",
            patch(routes::decoys::update).delete(routes::decoys::delete),
        )
        .route("/honeytokens", get(routes::honeytokens::list_fleet))
        .route("/honeytokens/node/{id}", get(routes::honeytokens::list_node))
        .route(
            "/honeytokens/{id}",
            patch(routes::honeytokens::update).delete(routes::honeytokens::delete),
        )
        // Event logs.
        .route("/logs", get(routes::logs::list_fleet))
        .route("/logs/node/{id}", get(routes::logs::list_node))
        // Alerts and dashboard.
        .route("/alerts", get(routes::alerts::list))
        .route("/alerts/{id}", patch(routes::alerts::update_status))
        .route("/stats", get(routes::alerts::stats))
        .route("/recent-attacks", get(routes::alerts::recent_attacks))
        .route(
            "/attacker-profile/{source_id}",
            get(routes::alerts::attacker_profile),
        )
        .route("/health", get(routes::alerts::health))
        // Agent surface.
        .route("/agent/register", post(routes::agent::register))
        .route("/agent/heartbeat", post(routes::agent::heartbeat))
        .route("/honeypot-log", post(routes::agent::honeypot_log))
        .route("/agent-alert", post(routes::agent::agent_alert))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
