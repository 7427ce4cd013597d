//! Dashboard statistics aggregation.
//!
//! Each figure is a single-collection aggregation filtered by the
//! owning user; the arithmetic happens here rather than in the query
//! language so it stays engine-agnostic and testable.

use mirage_core::error::MirageResult;
use mirage_core::repository::{DashboardStats, StatsRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NodeStatusRow {
    status: String,
}

#[derive(Debug, SurrealValue)]
struct AlertStatRow {
    status: String,
    risk: f64,
    source_ip: String,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// SurrealDB implementation of the dashboard statistics aggregation.
#[derive(Clone)]
pub struct SurrealStatsRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStatsRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> StatsRepository for SurrealStatsRepository<C> {
    async fn dashboard(
        &self,
        user_id: Uuid,
        high_risk_threshold: f64,
    ) -> MirageResult<DashboardStats> {
        let user_id_str = user_id.to_string();

        let mut result = self
            .db
            .query("SELECT status FROM node WHERE user_id = $user_id")
            .query("SELECT status, risk, source_ip FROM alert WHERE user_id = $user_id")
            .query(
                "SELECT VALUE risk FROM alert WHERE user_id = $user_id \
                 ORDER BY timestamp DESC LIMIT 10",
            )
            .bind(("user_id", user_id_str))
            .await
            .map_err(DbError::from)?;

        let nodes: Vec<NodeStatusRow> = result.take(0).map_err(DbError::from)?;
        let alerts: Vec<AlertStatRow> = result.take(1).map_err(DbError::from)?;
        let recent_risks: Vec<f64> = result.take(2).map_err(DbError::from)?;

        let total_nodes = nodes.len() as u64;
        let active_nodes = nodes.iter().filter(|n| n.status == "active").count() as u64;

        let total_attacks = alerts.len() as u64;
        let active_alerts = alerts
            .iter()
            .filter(|a| a.status == "open" || a.status == "investigating")
            .count() as u64;

        let unique_attackers = alerts
            .iter()
            .map(|a| a.source_ip.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len() as u64;

        let avg_risk_score = if alerts.is_empty() {
            0.0
        } else {
            round1(alerts.iter().map(|a| a.risk).sum::<f64>() / alerts.len() as f64)
        };

        let high_risk_count = alerts
            .iter()
            .filter(|a| a.risk >= high_risk_threshold)
            .count() as u64;

        let recent_risk_average = if recent_risks.is_empty() {
            0.0
        } else {
            round1(recent_risks.iter().sum::<f64>() / recent_risks.len() as f64)
        };

        Ok(DashboardStats {
            total_attacks,
            active_alerts,
            unique_attackers,
            avg_risk_score,
            high_risk_count,
            total_nodes,
            active_nodes,
            recent_risk_average,
        })
    }
}
