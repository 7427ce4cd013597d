//! SurrealDB implementation of [`NodeRepository`].
//!
//! The record id is the opaque node identifier, which makes node-id
//! uniqueness structural.

use chrono::{DateTime, Utc};
use mirage_core::error::MirageResult;
use mirage_core::models::node::{CreateNode, Node, NodeStatus};
use mirage_core::repository::NodeRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn parse_status(s: &str) -> Result<NodeStatus, DbError> {
    match s {
        "active" => Ok(NodeStatus::Active),
        "inactive" => Ok(NodeStatus::Inactive),
        "unknown" => Ok(NodeStatus::Unknown),
        other => Err(DbError::Row(format!("unknown node status: {other}"))),
    }
}

#[derive(Debug, SurrealValue)]
struct NodeRow {
    user_id: String,
    name: String,
    status: String,
    api_key_hash: String,
    hostname: Option<String>,
    os: Option<String>,
    last_seen: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct NodeRowWithId {
    record_id: String,
    user_id: String,
    name: String,
    status: String,
    api_key_hash: String,
    hostname: Option<String>,
    os: Option<String>,
    last_seen: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl NodeRow {
    fn into_node(self, node_id: String) -> Result<Node, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Row(format!("invalid owner UUID: {e}")))?;
        Ok(Node {
            node_id,
            user_id,
            name: self.name,
            status: parse_status(&self.status)?,
            api_key_hash: self.api_key_hash,
            hostname: self.hostname,
            os: self.os,
            last_seen: self.last_seen,
            created_at: self.created_at,
        })
    }
}

impl NodeRowWithId {
    fn try_into_node(self) -> Result<Node, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Row(format!("invalid owner UUID: {e}")))?;
        Ok(Node {
            node_id: self.record_id,
            user_id,
            name: self.name,
            status: parse_status(&self.status)?,
            api_key_hash: self.api_key_hash,
            hostname: self.hostname,
            os: self.os,
            last_seen: self.last_seen,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Node repository.
#[derive(Clone)]
pub struct SurrealNodeRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNodeRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NodeRepository for SurrealNodeRepository<C> {
    async fn create(&self, input: CreateNode) -> MirageResult<Node> {
        let node_id = input.node_id.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('node', $id) SET \
                 user_id = $user_id, name = $name, \
                 status = 'unknown', api_key_hash = $api_key_hash, \
                 hostname = NONE, os = NONE, last_seen = NONE",
            )
            .bind(("id", node_id.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("name", input.name))
            .bind(("api_key_hash", input.api_key_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from(e).or_conflict("node"))?;

        let rows: Vec<NodeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "node".into(),
            id: node_id.clone(),
        })?;

        Ok(row.into_node(node_id)?)
    }

    async fn get(&self, node_id: &str) -> MirageResult<Node> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('node', $id)")
            .bind(("id", node_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NodeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "node".into(),
            id: node_id.to_string(),
        })?;

        Ok(row.into_node(node_id.to_string())?)
    }

    async fn list_by_owner(&self, user_id: Uuid) -> MirageResult<Vec<Node>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM node \
                 WHERE user_id = $user_id \
                 ORDER BY created_at DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NodeRowWithId> = result.take(0).map_err(DbError::from)?;
        let nodes = rows
            .into_iter()
            .map(|row| row.try_into_node())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(nodes)
    }

    async fn update_status(&self, node_id: &str, status: NodeStatus) -> MirageResult<Node> {
        let mut result = self
            .db
            .query("UPDATE type::record('node', $id) SET status = $status")
            .bind(("id", node_id.to_string()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NodeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "node".into(),
            id: node_id.to_string(),
        })?;

        Ok(row.into_node(node_id.to_string())?)
    }

    async fn record_registration(
        &self,
        node_id: &str,
        hostname: &str,
        os: &str,
        at: DateTime<Utc>,
    ) -> MirageResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('node', $id) SET \
                 status = 'active', hostname = $hostname, os = $os, \
                 last_seen = $at",
            )
            .bind(("id", node_id.to_string()))
            .bind(("hostname", hostname.to_string()))
            .bind(("os", os.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NodeRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "node".into(),
                id: node_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn bump_last_seen(&self, node_id: &str, at: DateTime<Utc>) -> MirageResult<()> {
        self.db
            .query("UPDATE type::record('node', $id) SET last_seen = $at")
            .bind(("id", node_id.to_string()))
            .bind(("at", at))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn replace_api_key_hash(&self, node_id: &str, api_key_hash: &str) -> MirageResult<()> {
        let mut result = self
            .db
            .query("UPDATE type::record('node', $id) SET api_key_hash = $hash")
            .bind(("id", node_id.to_string()))
            .bind(("hash", api_key_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NodeRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "node".into(),
                id: node_id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    async fn delete(&self, node_id: &str) -> MirageResult<()> {
        self.db
            .query("DELETE type::record('node', $id)")
            .bind(("id", node_id.to_string()))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }
}
