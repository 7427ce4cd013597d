//! Node lifecycle: create (credential minted once), list, inspect,
//! status updates, deletion, and the agent bundle download.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use mirage_auth::{generate_node_id, mint_node_key};
use mirage_core::error::MirageError;
use mirage_core::models::node::{CreateNode, MAX_NODE_NAME_LEN, Node, NodeStatus};
use mirage_core::repository::{DecoyRepository, NodeRepository};
use serde::{Deserialize, Serialize};

use crate::bundle::build_agent_bundle;
use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::routes::owned_node;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateNodeRequest {
    pub name: String,
}

/// The only response shape that ever carries a node credential
/// cleartext.
#[derive(Debug, Serialize)]
pub struct CreateNodeResponse {
    #[serde(flatten)]
    pub node: Node,
    pub node_api_key: String,
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Json(req): Json<CreateNodeRequest>,
) -> ApiResult<Json<CreateNodeResponse>> {
    let name = req.name.trim();
    if name.is_empty() || name.len() > MAX_NODE_NAME_LEN {
        return Err(MirageError::invalid_input(format!(
            "node name must be 1..={MAX_NODE_NAME_LEN} characters"
        ))
        .into());
    }

    let (api_key, verifier) = mint_node_key();
    let node = state
        .nodes
        .create(CreateNode {
            node_id: generate_node_id(),
            user_id: scope,
            name: name.to_string(),
            api_key_hash: verifier,
        })
        .await?;

    tracing::info!(node_id = %node.node_id, owner = %scope, "node created");

    Ok(Json(CreateNodeResponse {
        node,
        node_api_key: api_key.expose().to_string(),
    }))
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
) -> ApiResult<Json<Vec<Node>>> {
    Ok(Json(state.nodes.list_by_owner(scope).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(node_id): Path<String>,
) -> ApiResult<Json<Node>> {
    Ok(Json(owned_node(&state, scope, &node_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateNodeRequest {
    pub status: NodeStatus,
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(node_id): Path<String>,
    Json(req): Json<UpdateNodeRequest>,
) -> ApiResult<Json<Node>> {
    owned_node(&state, scope, &node_id).await?;
    let node = state.nodes.update_status(&node_id, req.status).await?;
    Ok(Json(node))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(node_id): Path<String>,
) -> ApiResult<StatusCode> {
    owned_node(&state, scope, &node_id).await?;

    // Node-local bait state goes with the node; raw events and alerts
    // stay for audit but are unreachable through node-scoped queries.
    state.decoys.delete_by_node(&node_id).await?;
    state.nodes.delete(&node_id).await?;

    tracing::info!(node_id = %node_id, "node deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Build and stream the per-node agent bundle.
///
/// The node credential is stored only as a verifier, so the bundle
/// cannot embed the originally issued cleartext; instead a fresh
/// credential is minted here and atomically replaces the old
/// verifier.
pub async fn agent_download(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(node_id): Path<String>,
) -> ApiResult<Response> {
    let node = owned_node(&state, scope, &node_id).await?;

    let (api_key, verifier) = mint_node_key();
    state
        .nodes
        .replace_api_key_hash(&node.node_id, &verifier)
        .await?;

    let bytes = build_agent_bundle(
        &node,
        &api_key,
        &state.public_base_url,
        &state.classifier_url,
    )?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"agent-{}.zip\"", node.node_id),
        ),
    ];
    Ok((headers, bytes).into_response())
}
