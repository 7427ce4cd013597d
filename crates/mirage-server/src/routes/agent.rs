//! Agent-facing surface: registration, heartbeat, and the two
//! ingestion entry points.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use mirage_core::models::event::{AgentEventInput, HoneypotLogInput};
use mirage_core::repository::NodeRepository;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extract::NodeAuth;
use crate::pipeline::{IngestOutcome, ingest_agent_event, ingest_honeypot_log};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub node_id: String,
    pub node_api_key: String,
    pub hostname: String,
    pub os: String,
}

#[derive(Debug, Serialize)]
pub struct AgentAck {
    pub status: &'static str,
    pub node_id: String,
}

/// First-launch registration: verify the credential, promote the node
/// to active, record host metadata, bump last-seen. Idempotent.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<AgentAck>> {
    let node = state
        .identity
        .verify_node(&req.node_id, &req.node_api_key)
        .await?;

    state
        .nodes
        .record_registration(&node.node_id, &req.hostname, &req.os, Utc::now())
        .await?;

    tracing::info!(node_id = %node.node_id, hostname = %req.hostname, "agent registered");
    Ok(Json(AgentAck {
        status: "registered",
        node_id: node.node_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub node_id: String,
    pub node_api_key: String,
}

/// Liveness signal: bumps last-seen only. Idempotent.
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> ApiResult<Json<AgentAck>> {
    let node = state
        .identity
        .verify_node(&req.node_id, &req.node_api_key)
        .await?;

    state.nodes.bump_last_seen(&node.node_id, Utc::now()).await?;

    Ok(Json(AgentAck {
        status: "ok",
        node_id: node.node_id,
    }))
}

pub async fn honeypot_log(
    State(state): State<AppState>,
    NodeAuth(node): NodeAuth,
    Json(input): Json<HoneypotLogInput>,
) -> ApiResult<Json<IngestOutcome>> {
    let outcome = ingest_honeypot_log(&state, &node, input).await?;
    Ok(Json(outcome))
}

pub async fn agent_alert(
    State(state): State<AppState>,
    NodeAuth(node): NodeAuth,
    Json(input): Json<AgentEventInput>,
) -> ApiResult<Json<IngestOutcome>> {
    let outcome = ingest_agent_event(&state, &node, input).await?;
    Ok(Json(outcome))
}
