//! Decoy queries and management.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use mirage_core::models::decoy::{Decoy, DecoyKind, DecoyStatus};
use mirage_core::repository::{DEFAULT_DECOY_LIMIT, DecoyRepository, clamp_limit};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::routes::{node_id_set, owned_decoy, owned_node};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDecoyRequest {
    pub status: DecoyStatus,
}

pub(crate) async fn list_fleet_of_kind(
    state: &AppState,
    scope: Uuid,
    kind: Option<DecoyKind>,
    limit: Option<usize>,
) -> ApiResult<Vec<Decoy>> {
    let node_ids = node_id_set(state, scope).await?;
    if node_ids.is_empty() {
        return Ok(Vec::new());
    }
    let limit = clamp_limit(limit, DEFAULT_DECOY_LIMIT);
    Ok(state.decoys.list_by_nodes(&node_ids, kind, limit).await?)
}

pub(crate) async fn list_node_of_kind(
    state: &AppState,
    scope: Uuid,
    node_id: &str,
    kind: Option<DecoyKind>,
) -> ApiResult<Vec<Decoy>> {
    owned_node(state, scope, node_id).await?;
    Ok(state.decoys.list_by_node(node_id, kind).await?)
}

pub async fn list_fleet(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Decoy>>> {
    Ok(Json(
        list_fleet_of_kind(&state, scope, None, query.limit).await?,
    ))
}

pub async fn list_node(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(node_id): Path<String>,
) -> ApiResult<Json<Vec<Decoy>>> {
    Ok(Json(list_node_of_kind(&state, scope, &node_id, None).await?))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(decoy_id): Path<Uuid>,
    Json(req): Json<UpdateDecoyRequest>,
) -> ApiResult<Json<Decoy>> {
    owned_decoy(&state, scope, decoy_id).await?;
    Ok(Json(state.decoys.update_status(decoy_id, req.status).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(decoy_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_decoy(&state, scope, decoy_id).await?;
    state.decoys.delete(decoy_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
