//! Materialised high-risk alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::event::{AttackKind, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Open,
    Investigating,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Investigating => "investigating",
            AlertStatus::Resolved => "resolved",
        }
    }

    /// Open and investigating alerts still demand attention.
    pub fn is_active(&self) -> bool {
        matches!(self, AlertStatus::Open | AlertStatus::Investigating)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub service: String,
    pub activity: String,
    pub attack_kind: AttackKind,
    pub risk: f64,
    pub confidence: f64,
    /// SHA-256 hex of the triggering honeypot payload, if any.
    pub payload_digest: Option<String>,
    /// Name of the decoy an agent event referenced, if any.
    pub decoy: Option<String>,
    pub node_id: String,
    /// Denormalised from the node's owner at ingest time.
    pub user_id: Uuid,
    pub status: AlertStatus,
}

impl Alert {
    pub fn severity(&self) -> Severity {
        Severity::from_risk(self.risk)
    }
}

#[derive(Debug, Clone)]
pub struct CreateAlert {
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub service: String,
    pub activity: String,
    pub attack_kind: AttackKind,
    pub risk: f64,
    pub confidence: f64,
    pub payload_digest: Option<String>,
    pub decoy: Option<String>,
    pub node_id: String,
    pub user_id: Uuid,
}

/// SHA-256 hex digest used instead of echoing raw payloads into
/// alerts.
pub fn payload_digest(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}
