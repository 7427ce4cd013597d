//! HTTP handlers, grouped by resource.
//!
//! Scoping discipline: every user-facing handler takes the resolved
//! [`AuthUser`](crate::extract::AuthUser) scope, fleet-wide queries
//! fan out over the scope's node-id set, and node-specific paths load
//! the node and respond `Forbidden` when it is absent or foreign.

pub mod agent;
pub mod alerts;
pub mod auth;
pub mod decoys;
pub mod honeytokens;
pub mod logs;
pub mod nodes;

use mirage_core::error::MirageError;
use mirage_core::models::decoy::Decoy;
use mirage_core::models::node::Node;
use mirage_core::repository::{DecoyRepository, NodeRepository};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// Load a node and assert the scope owns it. Absent and foreign nodes
/// are indistinguishable to the caller.
pub(crate) async fn owned_node(
    state: &AppState,
    scope: Uuid,
    node_id: &str,
) -> ApiResult<Node> {
    match state.nodes.get(node_id).await {
        Ok(node) if node.user_id == scope => Ok(node),
        Ok(_) | Err(MirageError::NotFound { .. }) => Err(MirageError::forbidden(
            "node does not exist or belongs to another user",
        )
        .into()),
        Err(e) => Err(e.into()),
    }
}

/// Load a decoy and re-check ownership through its node.
pub(crate) async fn owned_decoy(state: &AppState, scope: Uuid, decoy_id: Uuid) -> ApiResult<Decoy> {
    let decoy = state.decoys.get(decoy_id).await?;
    owned_node(state, scope, &decoy.node_id).await?;
    Ok(decoy)
}

/// The scope's node-id set, resolved once per fleet-wide query.
pub(crate) async fn node_id_set(state: &AppState, scope: Uuid) -> ApiResult<Vec<String>> {
    let nodes = state.nodes.list_by_owner(scope).await?;
    Ok(nodes.into_iter().map(|n| n.node_id).collect())
}
