//! Decoy (bait resource) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoyKind {
    File,
    Service,
    Port,
    Honeytoken,
}

impl DecoyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecoyKind::File => "file",
            DecoyKind::Service => "service",
            DecoyKind::Port => "port",
            DecoyKind::Honeytoken => "honeytoken",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoyStatus {
    Active,
    Inactive,
}

impl DecoyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecoyStatus::Active => "active",
            DecoyStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decoy {
    pub id: Uuid,
    pub node_id: String,
    /// File or resource name; unique within a node.
    pub name: String,
    pub path: Option<String>,
    pub kind: DecoyKind,
    pub status: DecoyStatus,
    pub triggers: u64,
    pub last_triggered: Option<DateTime<Utc>>,
    pub port: Option<u16>,
    pub created_at: DateTime<Utc>,
}

/// Upsert input recorded when an agent event references a decoy name.
/// Repeated triggers for the same (node, name) increment the counter
/// instead of duplicating the row.
#[derive(Debug, Clone)]
pub struct DecoyTrigger {
    pub node_id: String,
    pub name: String,
    pub path: Option<String>,
    pub at: DateTime<Utc>,
}
