//! Honeytoken queries and management — the distinguished subset of
//! decoys with kind `honeytoken`.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use mirage_core::error::MirageError;
use mirage_core::models::decoy::{Decoy, DecoyKind, DecoyStatus};
use mirage_core::repository::DecoyRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::routes::decoys::{ListQuery, list_fleet_of_kind, list_node_of_kind};
use crate::routes::owned_decoy;
use crate::state::AppState;

/// Ownership plus kind check: honeytoken routes never touch other
/// decoy kinds.
async fn owned_honeytoken(state: &AppState, scope: Uuid, id: Uuid) -> ApiResult<Decoy> {
    let decoy = owned_decoy(state, scope, id).await?;
    if decoy.kind != DecoyKind::Honeytoken {
        return Err(MirageError::NotFound {
            entity: "honeytoken".into(),
            id: id.to_string(),
        }
        .into());
    }
    Ok(decoy)
}

pub async fn list_fleet(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Decoy>>> {
    Ok(Json(
        list_fleet_of_kind(&state, scope, Some(DecoyKind::Honeytoken), query.limit).await?,
    ))
}

pub async fn list_node(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(node_id): Path<String>,
) -> ApiResult<Json<Vec<Decoy>>> {
    Ok(Json(
        list_node_of_kind(&state, scope, &node_id, Some(DecoyKind::Honeytoken)).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateHoneytokenRequest {
    pub status: DecoyStatus,
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateHoneytokenRequest>,
) -> ApiResult<Json<Decoy>> {
    owned_honeytoken(&state, scope, id).await?;
    Ok(Json(state.decoys.update_status(id, req.status).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    owned_honeytoken(&state, scope, id).await?;
    state.decoys.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
