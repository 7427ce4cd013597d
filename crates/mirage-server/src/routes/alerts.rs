//! Alert queries, dashboard statistics, attacker profiles, and the
//! health probe.

use axum::Json;
use axum::extract::{Path, Query, State};
use mirage_core::error::MirageError;
use mirage_core::models::alert::{Alert, AlertStatus};
use mirage_core::models::event::Severity;
use mirage_core::models::profile::AttackerProfile;
use mirage_core::repository::{AlertFilter, AlertRepository, DashboardStats, ProfileRepository, StatsRepository, clamp_limit};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::AuthUser;
use crate::state::AppState;

const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
    pub severity: Option<String>,
    pub status: Option<String>,
}

fn parse_severity(raw: Option<&str>) -> ApiResult<Option<Severity>> {
    match raw {
        None => Ok(None),
        Some(label) => Severity::parse(label)
            .map(Some)
            .ok_or_else(|| MirageError::invalid_input(format!("unknown severity: {label}")).into()),
    }
}

fn parse_status(raw: Option<&str>) -> ApiResult<Option<AlertStatus>> {
    match raw {
        None => Ok(None),
        Some("open") => Ok(Some(AlertStatus::Open)),
        Some("investigating") => Ok(Some(AlertStatus::Investigating)),
        Some("resolved") => Ok(Some(AlertStatus::Resolved)),
        Some(other) => {
            Err(MirageError::invalid_input(format!("unknown alert status: {other}")).into())
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Query(query): Query<AlertsQuery>,
) -> ApiResult<Json<Vec<Alert>>> {
    let filter = AlertFilter {
        severity: parse_severity(query.severity.as_deref())?,
        status: parse_status(query.status.as_deref())?,
        limit: query.limit,
    };
    Ok(Json(state.alerts.list_by_owner(scope, &filter).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertRequest {
    pub status: AlertStatus,
}

pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Path(alert_id): Path<Uuid>,
    Json(req): Json<UpdateAlertRequest>,
) -> ApiResult<Json<Alert>> {
    let alert = state.alerts.get(alert_id).await?;
    if alert.user_id != scope {
        return Err(MirageError::forbidden("alert belongs to another user").into());
    }
    Ok(Json(state.alerts.update_status(alert_id, req.status).await?))
}

pub async fn stats(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
) -> ApiResult<Json<DashboardStats>> {
    let dashboard = state
        .stats
        .dashboard(scope, state.alert_risk_threshold)
        .await?;
    Ok(Json(dashboard))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub async fn recent_attacks(
    State(state): State<AppState>,
    AuthUser(scope): AuthUser,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<Alert>>> {
    let filter = AlertFilter {
        limit: Some(clamp_limit(query.limit, DEFAULT_RECENT_LIMIT)),
        ..AlertFilter::default()
    };
    Ok(Json(state.alerts.list_by_owner(scope, &filter).await?))
}

/// Attacker profiles are keyed by source identifier and global: a
/// source identifier is not a user-owned secret, so the profile is
/// served as-is to any authenticated caller.
pub async fn attacker_profile(
    State(state): State<AppState>,
    AuthUser(_scope): AuthUser,
    Path(source_id): Path<String>,
) -> ApiResult<Json<AttackerProfile>> {
    match state.profiles.get(&source_id).await? {
        Some(profile) => Ok(Json(profile)),
        None => Err(MirageError::NotFound {
            entity: "attacker_profile".into(),
            id: source_id,
        }
        .into()),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.db.client().health().await {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    };
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}
