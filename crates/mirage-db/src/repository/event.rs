//! SurrealDB implementation of [`EventRepository`].
//!
//! Honeypot logs and agent events live in separate append-only
//! tables; the listing operation merges them chronologically
//! descending.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use mirage_core::error::MirageResult;
use mirage_core::models::event::{
    AgentEventRecord, AttackKind, Classification, Event, HoneypotLogRecord, Severity,
};
use mirage_core::repository::{EventFilter, EventRepository, MAX_LIST_LIMIT};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ClassificationRow {
    attack_kind: String,
    risk: f64,
    confidence: f64,
    anomaly: bool,
}

impl From<&Classification> for ClassificationRow {
    fn from(c: &Classification) -> Self {
        ClassificationRow {
            attack_kind: c.attack_kind.as_str().to_string(),
            risk: c.risk,
            confidence: c.confidence,
            anomaly: c.anomaly,
        }
    }
}

impl ClassificationRow {
    fn into_classification(self) -> Classification {
        Classification {
            attack_kind: AttackKind::parse(&self.attack_kind),
            risk: self.risk,
            confidence: self.confidence,
            anomaly: self.anomaly,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct HoneypotRowWithId {
    record_id: String,
    node_id: String,
    service: String,
    source_ip: String,
    activity: String,
    payload: String,
    extra: BTreeMap<String, String>,
    timestamp: DateTime<Utc>,
    received_at: DateTime<Utc>,
    classification: ClassificationRow,
}

impl HoneypotRowWithId {
    fn try_into_record(self) -> Result<HoneypotLogRecord, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Row(format!("invalid event UUID: {e}")))?;
        Ok(HoneypotLogRecord {
            id,
            node_id: self.node_id,
            service: self.service,
            source_ip: self.source_ip,
            activity: self.activity,
            payload: self.payload,
            extra: self.extra,
            timestamp: self.timestamp,
            received_at: self.received_at,
            classification: self.classification.into_classification(),
        })
    }
}

#[derive(Debug, SurrealValue)]
struct AgentRowWithId {
    record_id: String,
    node_id: String,
    hostname: String,
    username: String,
    file_accessed: String,
    file_path: String,
    action: String,
    severity: String,
    alert_kind: String,
    timestamp: DateTime<Utc>,
    received_at: DateTime<Utc>,
    classification: ClassificationRow,
}

impl AgentRowWithId {
    fn try_into_record(self) -> Result<AgentEventRecord, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Row(format!("invalid event UUID: {e}")))?;
        let severity = Severity::parse(&self.severity)
            .ok_or_else(|| DbError::Row(format!("unknown severity: {}", self.severity)))?;
        Ok(AgentEventRecord {
            id,
            node_id: self.node_id,
            hostname: self.hostname,
            username: self.username,
            file_accessed: self.file_accessed,
            file_path: self.file_path,
            action: self.action,
            severity,
            alert_kind: self.alert_kind,
            timestamp: self.timestamp,
            received_at: self.received_at,
            classification: self.classification.into_classification(),
        })
    }
}

/// SurrealDB implementation of the Event repository.
#[derive(Clone)]
pub struct SurrealEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EventRepository for SurrealEventRepository<C> {
    async fn append_honeypot(&self, record: HoneypotLogRecord) -> MirageResult<()> {
        self.db
            .query(
                "CREATE type::record('honeypot_log', $id) SET \
                 node_id = $node_id, service = $service, \
                 source_ip = $source_ip, activity = $activity, \
                 payload = $payload, extra = $extra, \
                 timestamp = $timestamp, received_at = $received_at, \
                 classification = $classification",
            )
            .bind(("id", record.id.to_string()))
            .bind(("node_id", record.node_id))
            .bind(("service", record.service))
            .bind(("source_ip", record.source_ip))
            .bind(("activity", record.activity))
            .bind(("payload", record.payload))
            .bind(("extra", record.extra))
            .bind(("timestamp", record.timestamp))
            .bind(("received_at", record.received_at))
            .bind(("classification", ClassificationRow::from(&record.classification)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn append_agent(&self, record: AgentEventRecord) -> MirageResult<()> {
        self.db
            .query(
                "CREATE type::record('agent_event', $id) SET \
                 node_id = $node_id, hostname = $hostname, \
                 username = $username, file_accessed = $file_accessed, \
                 file_path = $file_path, action = $action, \
                 severity = $severity, alert_kind = $alert_kind, \
                 timestamp = $timestamp, received_at = $received_at, \
                 classification = $classification",
            )
            .bind(("id", record.id.to_string()))
            .bind(("node_id", record.node_id))
            .bind(("hostname", record.hostname))
            .bind(("username", record.username))
            .bind(("file_accessed", record.file_accessed))
            .bind(("file_path", record.file_path))
            .bind(("action", record.action))
            .bind(("severity", record.severity.as_str().to_string()))
            .bind(("alert_kind", record.alert_kind))
            .bind(("timestamp", record.timestamp))
            .bind(("received_at", record.received_at))
            .bind(("classification", ClassificationRow::from(&record.classification)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn list_for_nodes(
        &self,
        node_ids: &[String],
        filter: &EventFilter,
    ) -> MirageResult<Vec<Event>> {
        if node_ids.is_empty() {
            return Ok(Vec::new());
        }
        let limit = filter.limit.min(MAX_LIST_LIMIT) as u64;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM honeypot_log \
                 WHERE node_id IN $node_ids \
                 ORDER BY timestamp DESC LIMIT $limit",
            )
            .query(
                "SELECT meta::id(id) AS record_id, * FROM agent_event \
                 WHERE node_id IN $node_ids \
                 ORDER BY timestamp DESC LIMIT $limit",
            )
            .bind(("node_ids", node_ids.to_vec()))
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let honeypot_rows: Vec<HoneypotRowWithId> = result.take(0).map_err(DbError::from)?;
        let agent_rows: Vec<AgentRowWithId> = result.take(1).map_err(DbError::from)?;

        let mut events = Vec::with_capacity(honeypot_rows.len() + agent_rows.len());
        for row in honeypot_rows {
            events.push(Event::Honeypot(row.try_into_record()?));
        }
        for row in agent_rows {
            events.push(Event::Agent(row.try_into_record()?));
        }

        if let Some(severity) = filter.severity {
            events.retain(|e| e.severity() == severity);
        }
        if let Some(search) = &filter.search {
            events.retain(|e| e.matches_search(search));
        }

        events.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        events.truncate(limit as usize);

        Ok(events)
    }
}
