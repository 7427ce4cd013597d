//! SurrealDB implementation of [`AlertRepository`].

use chrono::{DateTime, Utc};
use mirage_core::error::MirageResult;
use mirage_core::models::alert::{Alert, AlertStatus, CreateAlert};
use mirage_core::models::event::AttackKind;
use mirage_core::repository::{AlertFilter, AlertRepository, DEFAULT_ALERT_LIMIT, clamp_limit};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn parse_status(s: &str) -> Result<AlertStatus, DbError> {
    match s {
        "open" => Ok(AlertStatus::Open),
        "investigating" => Ok(AlertStatus::Investigating),
        "resolved" => Ok(AlertStatus::Resolved),
        other => Err(DbError::Row(format!("unknown alert status: {other}"))),
    }
}

#[derive(Debug, SurrealValue)]
struct AlertRowWithId {
    record_id: String,
    user_id: String,
    timestamp: DateTime<Utc>,
    source_ip: String,
    service: String,
    activity: String,
    attack_kind: String,
    risk: f64,
    confidence: f64,
    payload_digest: Option<String>,
    decoy: Option<String>,
    node_id: String,
    status: String,
}

impl AlertRowWithId {
    fn try_into_alert(self) -> Result<Alert, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Row(format!("invalid alert UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Row(format!("invalid owner UUID: {e}")))?;
        Ok(Alert {
            id,
            timestamp: self.timestamp,
            source_ip: self.source_ip,
            service: self.service,
            activity: self.activity,
            attack_kind: AttackKind::parse(&self.attack_kind),
            risk: self.risk,
            confidence: self.confidence,
            payload_digest: self.payload_digest,
            decoy: self.decoy,
            node_id: self.node_id,
            user_id,
            status: parse_status(&self.status)?,
        })
    }
}

/// SurrealDB implementation of the Alert repository.
#[derive(Clone)]
pub struct SurrealAlertRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAlertRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AlertRepository for SurrealAlertRepository<C> {
    async fn create(&self, input: CreateAlert) -> MirageResult<Alert> {
        let id = Uuid::new_v4();

        let mut result = self
            .db
            .query(
                "CREATE type::record('alert', $id) SET \
                 user_id = $user_id, timestamp = $timestamp, \
                 source_ip = $source_ip, service = $service, \
                 activity = $activity, attack_kind = $attack_kind, \
                 risk = $risk, confidence = $confidence, \
                 payload_digest = $payload_digest, decoy = $decoy, \
                 node_id = $node_id, status = 'open' \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("timestamp", input.timestamp))
            .bind(("source_ip", input.source_ip))
            .bind(("service", input.service))
            .bind(("activity", input.activity))
            .bind(("attack_kind", input.attack_kind.as_str().to_string()))
            .bind(("risk", input.risk))
            .bind(("confidence", input.confidence))
            .bind(("payload_digest", input.payload_digest))
            .bind(("decoy", input.decoy))
            .bind(("node_id", input.node_id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AlertRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "alert".into(),
            id: id.to_string(),
        })?;

        Ok(row.try_into_alert()?)
    }

    async fn get(&self, id: Uuid) -> MirageResult<Alert> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('alert', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AlertRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "alert".into(),
            id: id_str,
        })?;

        Ok(row.try_into_alert()?)
    }

    async fn list_by_owner(&self, user_id: Uuid, filter: &AlertFilter) -> MirageResult<Vec<Alert>> {
        let limit = clamp_limit(filter.limit, DEFAULT_ALERT_LIMIT) as u64;

        let query = match filter.status {
            Some(_) => {
                "SELECT meta::id(id) AS record_id, * FROM alert \
                 WHERE user_id = $user_id AND status = $status \
                 ORDER BY timestamp DESC LIMIT $limit"
            }
            None => {
                "SELECT meta::id(id) AS record_id, * FROM alert \
                 WHERE user_id = $user_id \
                 ORDER BY timestamp DESC LIMIT $limit"
            }
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("user_id", user_id.to_string()))
            .bind(("limit", limit));
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.as_str().to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AlertRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut alerts = rows
            .into_iter()
            .map(|row| row.try_into_alert())
            .collect::<Result<Vec<_>, DbError>>()?;

        // Severity is derived from risk, so this filter stays in
        // application space.
        if let Some(severity) = filter.severity {
            alerts.retain(|a| a.severity() == severity);
        }

        Ok(alerts)
    }

    async fn update_status(&self, id: Uuid, status: AlertStatus) -> MirageResult<Alert> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "UPDATE type::record('alert', $id) SET status = $status \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AlertRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "alert".into(),
            id: id_str,
        })?;

        Ok(row.try_into_alert()?)
    }
}
