//! Node (deployed probe) model.
//!
//! A node is either a honeypot host or an endpoint agent. It is owned
//! by exactly one user, and that ownership is immutable after
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Active,
    Inactive,
    /// Created but never heard from; promoted to `Active` by agent
    /// registration.
    Unknown,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Active => "active",
            NodeStatus::Inactive => "inactive",
            NodeStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Opaque, URL-safe, globally unique.
    pub node_id: String,
    pub user_id: Uuid,
    pub name: String,
    pub status: NodeStatus,
    /// SHA-256 hex of the node credential. The cleartext exists only
    /// in the create-node response. Never serialised back out.
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub hostname: Option<String>,
    pub os: Option<String>,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNode {
    pub node_id: String,
    pub user_id: Uuid,
    pub name: String,
    pub api_key_hash: String,
}

/// Maximum accepted node name length.
pub const MAX_NODE_NAME_LEN: usize = 100;
