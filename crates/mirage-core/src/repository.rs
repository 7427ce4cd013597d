//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and single-entity: one logical
//! read or one logical write each. Multi-step workflows (the
//! ingestion pipeline, the query layer's fan-out) are orchestrated
//! above the store and do not assume multi-entity transactions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MirageResult;
use crate::models::{
    alert::{Alert, AlertStatus, CreateAlert},
    decoy::{Decoy, DecoyKind, DecoyStatus, DecoyTrigger},
    event::{AgentEventRecord, Event, HoneypotLogRecord, Severity},
    node::{CreateNode, Node, NodeStatus},
    profile::AttackerProfile,
    user::{CreateUser, User},
};

/// Hard cap applied to every listing, regardless of the requested
/// limit.
pub const MAX_LIST_LIMIT: usize = 1000;
pub const DEFAULT_EVENT_LIMIT: usize = 100;
pub const DEFAULT_DECOY_LIMIT: usize = 50;
pub const DEFAULT_ALERT_LIMIT: usize = 50;

pub fn clamp_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).min(MAX_LIST_LIMIT)
}

pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` if the email is already registered.
    fn create(&self, input: CreateUser) -> impl Future<Output = MirageResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = MirageResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MirageResult<User>> + Send;
}

pub trait NodeRepository: Send + Sync {
    fn create(&self, input: CreateNode) -> impl Future<Output = MirageResult<Node>> + Send;
    fn get(&self, node_id: &str) -> impl Future<Output = MirageResult<Node>> + Send;
    /// Newest first.
    fn list_by_owner(&self, user_id: Uuid) -> impl Future<Output = MirageResult<Vec<Node>>> + Send;
    fn update_status(
        &self,
        node_id: &str,
        status: NodeStatus,
    ) -> impl Future<Output = MirageResult<Node>> + Send;
    /// Agent registration: promote to active, record host metadata,
    /// bump last-seen. Idempotent.
    fn record_registration(
        &self,
        node_id: &str,
        hostname: &str,
        os: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = MirageResult<()>> + Send;
    fn bump_last_seen(
        &self,
        node_id: &str,
        at: DateTime<Utc>,
    ) -> impl Future<Output = MirageResult<()>> + Send;
    /// Atomically replace the credential verifier (bundle re-mint).
    fn replace_api_key_hash(
        &self,
        node_id: &str,
        api_key_hash: &str,
    ) -> impl Future<Output = MirageResult<()>> + Send;
    fn delete(&self, node_id: &str) -> impl Future<Output = MirageResult<()>> + Send;
}

pub trait DecoyRepository: Send + Sync {
    /// Upsert keyed on (node id, name): first trigger creates the
    /// decoy, later ones increment the counter and move
    /// last-triggered forward. Must be idempotent under concurrent
    /// callers.
    fn record_trigger(
        &self,
        trigger: DecoyTrigger,
    ) -> impl Future<Output = MirageResult<Decoy>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = MirageResult<Decoy>> + Send;
    fn list_by_node(
        &self,
        node_id: &str,
        kind: Option<DecoyKind>,
    ) -> impl Future<Output = MirageResult<Vec<Decoy>>> + Send;
    fn list_by_nodes(
        &self,
        node_ids: &[String],
        kind: Option<DecoyKind>,
        limit: usize,
    ) -> impl Future<Output = MirageResult<Vec<Decoy>>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: DecoyStatus,
    ) -> impl Future<Output = MirageResult<Decoy>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = MirageResult<()>> + Send;
    /// Node-deletion cascade.
    fn delete_by_node(&self, node_id: &str) -> impl Future<Output = MirageResult<()>> + Send;
}

/// Filters for the merged event listing. Node scoping happens through
/// the `node_ids` argument of the listing call itself.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub severity: Option<Severity>,
    /// Case-insensitive substring over source identifier, activity,
    /// event kind, accessed file, decoy name.
    pub search: Option<String>,
    pub limit: usize,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            severity: None,
            search: None,
            limit: DEFAULT_EVENT_LIMIT,
        }
    }
}

pub trait EventRepository: Send + Sync {
    fn append_honeypot(
        &self,
        record: HoneypotLogRecord,
    ) -> impl Future<Output = MirageResult<()>> + Send;
    fn append_agent(
        &self,
        record: AgentEventRecord,
    ) -> impl Future<Output = MirageResult<()>> + Send;
    /// Chronologically descending merge of both event streams for the
    /// given nodes.
    fn list_for_nodes(
        &self,
        node_ids: &[String],
        filter: &EventFilter,
    ) -> impl Future<Output = MirageResult<Vec<Event>>> + Send;
}

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub status: Option<AlertStatus>,
    pub limit: Option<usize>,
}

pub trait AlertRepository: Send + Sync {
    fn create(&self, input: CreateAlert) -> impl Future<Output = MirageResult<Alert>> + Send;
    fn get(&self, id: Uuid) -> impl Future<Output = MirageResult<Alert>> + Send;
    /// Timestamp descending, filtered by the denormalised owner.
    fn list_by_owner(
        &self,
        user_id: Uuid,
        filter: &AlertFilter,
    ) -> impl Future<Output = MirageResult<Vec<Alert>>> + Send;
    fn update_status(
        &self,
        id: Uuid,
        status: AlertStatus,
    ) -> impl Future<Output = MirageResult<Alert>> + Send;
}

pub trait ProfileRepository: Send + Sync {
    fn get(
        &self,
        source_ip: &str,
    ) -> impl Future<Output = MirageResult<Option<AttackerProfile>>> + Send;
    /// Whole-document upsert; serialisation per source identifier is
    /// the aggregator's responsibility.
    fn put(&self, profile: &AttackerProfile) -> impl Future<Output = MirageResult<()>> + Send;
}

/// Aggregated dashboard statistics for one user.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DashboardStats {
    pub total_attacks: u64,
    pub active_alerts: u64,
    pub unique_attackers: u64,
    /// One decimal place.
    pub avg_risk_score: f64,
    pub high_risk_count: u64,
    pub total_nodes: u64,
    pub active_nodes: u64,
    /// Mean risk over the 10 most recent alerts, one decimal place.
    pub recent_risk_average: f64,
}

pub trait StatsRepository: Send + Sync {
    fn dashboard(
        &self,
        user_id: Uuid,
        high_risk_threshold: f64,
    ) -> impl Future<Output = MirageResult<DashboardStats>> + Send;
}
