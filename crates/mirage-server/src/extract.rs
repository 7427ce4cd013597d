//! Request extractors for the two authentication schemes.
//!
//! The bearer is resolved exactly once per request and handed to the
//! handler as an explicit scope value; handlers never re-parse
//! headers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use mirage_core::error::MirageError;
use mirage_core::models::node::Node;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated dashboard principal (query scope).
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError(MirageError::unauthenticated("missing bearer token"))
        })?;

        let user_id = state.identity.verify_bearer(token)?;
        Ok(AuthUser(user_id))
    }
}

/// The authenticated ingestion node, resolved from the
/// `X-Node-Id`/`X-Node-Key` header pair.
#[derive(Debug, Clone)]
pub struct NodeAuth(pub Node);

impl FromRequestParts<AppState> for NodeAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let node_id = parts
            .headers
            .get("x-node-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError(MirageError::unauthenticated("missing X-Node-Id header")))?;
        let node_key = parts
            .headers
            .get("x-node-key")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError(MirageError::unauthenticated("missing X-Node-Key header")))?;

        let node = state.identity.verify_node(node_id, node_key).await?;
        Ok(NodeAuth(node))
    }
}
