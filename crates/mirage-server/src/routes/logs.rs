//! Security event log queries: a chronologically descending merge of
//! honeypot logs and agent events, fleet-wide or per node.

use axum::Json;
use axum::extract::{Path, Query, State};
use mirage_core::error::MirageError;
use mirage_core::models::event::{Event, Severity};
use mirage_core::repository::{DEFAULT_EVENT_LIMIT, EventFilter, EventRepository, clamp_limit};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::routes::{node_id_set, owned_node};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<usize>,
    pub node_id: Option<String>,
    pub severity: Option<String>,
    pub search: Option<String>,
}

fn parse_severity(raw: Option<&str>) -> ApiResult<Option<Severity>> {
    match raw {
        None => Ok(None),
        Some(label) => Severity::parse(label)
            .map(Some)
            .ok_or_else(|| MirageError::invalid_input(format!("unknown severity: {label}")).into()),
    }
}

fn build_filter(query: &LogsQuery) -> ApiResult<EventFilter> {
    Ok(EventFilter {
        severity: parse_severity(query.severity.as_deref())?,
        search: query.search.clone(),
        limit: clamp_limit(query.limit, DEFAULT_EVENT_LIMIT),
    })
}

pub async fn list_fleet(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let filter = build_filter(&query)?;

    let mut node_ids = node_id_set(&state, scope).await?;
    if let Some(requested) = &query.node_id {
        // A node filter must stay inside the scope's fleet.
        if !node_ids.iter().any(|id| id == requested) {
            return Err(MirageError::forbidden(
                "node does not exist or belongs to another user",
            )
            .into());
        }
        node_ids = vec![requested.clone()];
    }

    Ok(Json(state.events.list_for_nodes(&node_ids, &filter).await?))
}

pub async fn list_node(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(node_id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let filter = build_filter(&query)?;
    owned_node(&state, scope, &node_id).await?;

    let node_ids = vec![node_id];
    Ok(Json(state.events.list_for_nodes(&node_ids, &filter).await?))
}
