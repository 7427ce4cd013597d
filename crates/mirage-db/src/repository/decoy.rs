//! SurrealDB implementation of [`DecoyRepository`].
//!
//! Triggers are an upsert keyed on (node id, name): the unique index
//! makes a concurrent double-create collapse into one row, and the
//! increment re-runs as a plain update.

use chrono::{DateTime, Utc};
use mirage_core::error::MirageResult;
use mirage_core::models::decoy::{Decoy, DecoyKind, DecoyStatus, DecoyTrigger};
use mirage_core::repository::DecoyRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

fn parse_kind(s: &str) -> Result<DecoyKind, DbError> {
    match s {
        "file" => Ok(DecoyKind::File),
        "service" => Ok(DecoyKind::Service),
        "port" => Ok(DecoyKind::Port),
        "honeytoken" => Ok(DecoyKind::Honeytoken),
        other => Err(DbError::Row(format!("unknown decoy kind: {other}"))),
    }
}

fn parse_status(s: &str) -> Result<DecoyStatus, DbError> {
    match s {
        "active" => Ok(DecoyStatus::Active),
        "inactive" => Ok(DecoyStatus::Inactive),
        other => Err(DbError::Row(format!("unknown decoy status: {other}"))),
    }
}

#[derive(Debug, SurrealValue)]
struct DecoyRowWithId {
    record_id: String,
    node_id: String,
    name: String,
    path: Option<String>,
    kind: String,
    status: String,
    triggers: u64,
    last_triggered: Option<DateTime<Utc>>,
    port: Option<u16>,
    created_at: DateTime<Utc>,
}

impl DecoyRowWithId {
    fn try_into_decoy(self) -> Result<Decoy, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Row(format!("invalid decoy UUID: {e}")))?;
        Ok(Decoy {
            id,
            node_id: self.node_id,
            name: self.name,
            path: self.path,
            kind: parse_kind(&self.kind)?,
            status: parse_status(&self.status)?,
            triggers: self.triggers,
            last_triggered: self.last_triggered,
            port: self.port,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Decoy repository.
#[derive(Clone)]
pub struct SurrealDecoyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDecoyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn increment(&self, trigger: &DecoyTrigger) -> Result<Option<Decoy>, DbError> {
        let mut result = self
            .db
            .query(
                "UPDATE decoy SET triggers += 1, last_triggered = $at \
                 WHERE node_id = $node_id AND name = $name \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("at", trigger.at))
            .bind(("node_id", trigger.node_id.clone()))
            .bind(("name", trigger.name.clone()))
            .await?;

        let rows: Vec<DecoyRowWithId> = result.take(0)?;
        rows.into_iter().next().map(|r| r.try_into_decoy()).transpose()
    }
}

impl<C: Connection> DecoyRepository for SurrealDecoyRepository<C> {
    async fn record_trigger(&self, trigger: DecoyTrigger) -> MirageResult<Decoy> {
        if let Some(decoy) = self.increment(&trigger).await? {
            return Ok(decoy);
        }

        // First trigger for this (node, name): create the decoy.
        let id = Uuid::new_v4().to_string();
        let created = self
            .db
            .query(
                "CREATE type::record('decoy', $id) SET \
                 node_id = $node_id, name = $name, path = $path, \
                 kind = 'honeytoken', status = 'active', \
                 triggers = 1, last_triggered = $at, port = NONE \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id))
            .bind(("node_id", trigger.node_id.clone()))
            .bind(("name", trigger.name.clone()))
            .bind(("path", trigger.path.clone()))
            .bind(("at", trigger.at))
            .await
            .map_err(DbError::from)?
            .check();

        match created {
            Ok(mut result) => {
                let rows: Vec<DecoyRowWithId> = result.take(0).map_err(DbError::from)?;
                let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
                    entity: "decoy".into(),
                    id: format!("{}/{}", trigger.node_id, trigger.name),
                })?;
                Ok(row.try_into_decoy()?)
            }
            // A concurrent caller created the row first; the unique
            // index rejected ours. Re-run as an increment.
            Err(_) => {
                let decoy = self.increment(&trigger).await?;
                decoy
                    .ok_or_else(|| {
                        DbError::NotFound {
                            entity: "decoy".into(),
                            id: format!("{}/{}", trigger.node_id, trigger.name),
                        }
                        .into()
                    })
            }
        }
    }

    async fn get(&self, id: Uuid) -> MirageResult<Decoy> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM type::record('decoy', $id)",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DecoyRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "decoy".into(),
            id: id_str,
        })?;

        Ok(row.try_into_decoy()?)
    }

    async fn list_by_node(
        &self,
        node_id: &str,
        kind: Option<DecoyKind>,
    ) -> MirageResult<Vec<Decoy>> {
        let query = match kind {
            Some(_) => {
                "SELECT meta::id(id) AS record_id, * FROM decoy \
                 WHERE node_id = $node_id AND kind = $kind \
                 ORDER BY created_at DESC"
            }
            None => {
                "SELECT meta::id(id) AS record_id, * FROM decoy \
                 WHERE node_id = $node_id \
                 ORDER BY created_at DESC"
            }
        };

        let mut builder = self.db.query(query).bind(("node_id", node_id.to_string()));
        if let Some(kind) = kind {
            builder = builder.bind(("kind", kind.as_str().to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<DecoyRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_decoy())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_by_nodes(
        &self,
        node_ids: &[String],
        kind: Option<DecoyKind>,
        limit: usize,
    ) -> MirageResult<Vec<Decoy>> {
        let query = match kind {
            Some(_) => {
                "SELECT meta::id(id) AS record_id, * FROM decoy \
                 WHERE node_id IN $node_ids AND kind = $kind \
                 ORDER BY created_at DESC LIMIT $limit"
            }
            None => {
                "SELECT meta::id(id) AS record_id, * FROM decoy \
                 WHERE node_id IN $node_ids \
                 ORDER BY created_at DESC LIMIT $limit"
            }
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("node_ids", node_ids.to_vec()))
            .bind(("limit", limit as u64));
        if let Some(kind) = kind {
            builder = builder.bind(("kind", kind.as_str().to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<DecoyRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_decoy())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn update_status(&self, id: Uuid, status: DecoyStatus) -> MirageResult<Decoy> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(
                "UPDATE type::record('decoy', $id) SET status = $status \
                 RETURN meta::id(id) AS record_id, *",
            )
            .bind(("id", id_str.clone()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DecoyRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "decoy".into(),
            id: id_str,
        })?;

        Ok(row.try_into_decoy()?)
    }

    async fn delete(&self, id: Uuid) -> MirageResult<()> {
        self.db
            .query("DELETE type::record('decoy', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn delete_by_node(&self, node_id: &str) -> MirageResult<()> {
        self.db
            .query("DELETE decoy WHERE node_id = $node_id")
            .bind(("node_id", node_id.to_string()))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }
}
