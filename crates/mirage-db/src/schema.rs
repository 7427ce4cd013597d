//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs and node identifiers are stored as strings. Enums are stored
//! as strings with ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD created_at ON TABLE user TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;

-- =======================================================================
-- Nodes (record id = opaque node identifier)
-- =======================================================================
DEFINE TABLE node SCHEMAFULL;
DEFINE FIELD user_id ON TABLE node TYPE string;
DEFINE FIELD name ON TABLE node TYPE string;
DEFINE FIELD status ON TABLE node TYPE string \
    ASSERT $value IN ['active', 'inactive', 'unknown'];
DEFINE FIELD api_key_hash ON TABLE node TYPE string;
DEFINE FIELD hostname ON TABLE node TYPE option<string>;
DEFINE FIELD os ON TABLE node TYPE option<string>;
DEFINE FIELD last_seen ON TABLE node TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE node TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_node_owner ON TABLE node COLUMNS user_id;

-- =======================================================================
-- Decoys
-- =======================================================================
DEFINE TABLE decoy SCHEMAFULL;
DEFINE FIELD node_id ON TABLE decoy TYPE string;
DEFINE FIELD name ON TABLE decoy TYPE string;
DEFINE FIELD path ON TABLE decoy TYPE option<string>;
DEFINE FIELD kind ON TABLE decoy TYPE string \
    ASSERT $value IN ['file', 'service', 'port', 'honeytoken'];
DEFINE FIELD status ON TABLE decoy TYPE string \
    ASSERT $value IN ['active', 'inactive'];
DEFINE FIELD triggers ON TABLE decoy TYPE int;
DEFINE FIELD last_triggered ON TABLE decoy TYPE option<datetime>;
DEFINE FIELD port ON TABLE decoy TYPE option<int>;
DEFINE FIELD created_at ON TABLE decoy TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_decoy_node ON TABLE decoy COLUMNS node_id;
DEFINE INDEX idx_decoy_node_name ON TABLE decoy COLUMNS node_id, name \
    UNIQUE;

-- =======================================================================
-- Honeypot logs (append-only)
-- =======================================================================
DEFINE TABLE honeypot_log SCHEMAFULL;
DEFINE FIELD node_id ON TABLE honeypot_log TYPE string;
DEFINE FIELD service ON TABLE honeypot_log TYPE string;
DEFINE FIELD source_ip ON TABLE honeypot_log TYPE string;
DEFINE FIELD activity ON TABLE honeypot_log TYPE string;
DEFINE FIELD payload ON TABLE honeypot_log TYPE string;
DEFINE FIELD extra ON TABLE honeypot_log TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD timestamp ON TABLE honeypot_log TYPE datetime;
DEFINE FIELD received_at ON TABLE honeypot_log TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD classification ON TABLE honeypot_log TYPE object FLEXIBLE;
DEFINE INDEX idx_honeypot_node ON TABLE honeypot_log COLUMNS node_id;
DEFINE INDEX idx_honeypot_node_ts ON TABLE honeypot_log \
    COLUMNS node_id, timestamp;

-- =======================================================================
-- Agent events (append-only)
-- =======================================================================
DEFINE TABLE agent_event SCHEMAFULL;
DEFINE FIELD node_id ON TABLE agent_event TYPE string;
DEFINE FIELD hostname ON TABLE agent_event TYPE string;
DEFINE FIELD username ON TABLE agent_event TYPE string;
DEFINE FIELD file_accessed ON TABLE agent_event TYPE string;
DEFINE FIELD file_path ON TABLE agent_event TYPE string;
DEFINE FIELD action ON TABLE agent_event TYPE string;
DEFINE FIELD severity ON TABLE agent_event TYPE string \
    ASSERT $value IN ['low', 'medium', 'high', 'critical'];
DEFINE FIELD alert_kind ON TABLE agent_event TYPE string;
DEFINE FIELD timestamp ON TABLE agent_event TYPE datetime;
DEFINE FIELD received_at ON TABLE agent_event TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD classification ON TABLE agent_event TYPE object FLEXIBLE;
DEFINE INDEX idx_agent_event_node ON TABLE agent_event COLUMNS node_id;
DEFINE INDEX idx_agent_event_node_ts ON TABLE agent_event \
    COLUMNS node_id, timestamp;

-- =======================================================================
-- Alerts (owner denormalised from the node at ingest time)
-- =======================================================================
DEFINE TABLE alert SCHEMAFULL;
DEFINE FIELD user_id ON TABLE alert TYPE string;
DEFINE FIELD timestamp ON TABLE alert TYPE datetime;
DEFINE FIELD source_ip ON TABLE alert TYPE string;
DEFINE FIELD service ON TABLE alert TYPE string;
DEFINE FIELD activity ON TABLE alert TYPE string;
DEFINE FIELD attack_kind ON TABLE alert TYPE string;
DEFINE FIELD risk ON TABLE alert TYPE float;
DEFINE FIELD confidence ON TABLE alert TYPE float;
DEFINE FIELD payload_digest ON TABLE alert TYPE option<string>;
DEFINE FIELD decoy ON TABLE alert TYPE option<string>;
DEFINE FIELD node_id ON TABLE alert TYPE string;
DEFINE FIELD status ON TABLE alert TYPE string \
    ASSERT $value IN ['open', 'investigating', 'resolved'];
DEFINE INDEX idx_alert_owner ON TABLE alert COLUMNS user_id;
DEFINE INDEX idx_alert_risk ON TABLE alert COLUMNS risk;
DEFINE INDEX idx_alert_owner_ts ON TABLE alert COLUMNS user_id, timestamp;

-- =======================================================================
-- Attacker profiles (record id = source identifier)
-- =======================================================================
DEFINE TABLE attacker_profile SCHEMAFULL;
DEFINE FIELD source_ip ON TABLE attacker_profile TYPE string;
DEFINE FIELD total_attacks ON TABLE attacker_profile TYPE int;
DEFINE FIELD most_common_attack ON TABLE attacker_profile TYPE string;
DEFINE FIELD average_risk ON TABLE attacker_profile TYPE float;
DEFINE FIELD first_seen ON TABLE attacker_profile TYPE datetime;
DEFINE FIELD last_seen ON TABLE attacker_profile TYPE datetime;
DEFINE FIELD attack_kinds ON TABLE attacker_profile TYPE object FLEXIBLE;
DEFINE FIELD services_targeted ON TABLE attacker_profile \
    TYPE array<string>;
";

// -----------------------------------------------------------------------
// Runner
// -----------------------------------------------------------------------

/// Apply all pending migrations. Idempotent: already-applied versions
/// are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version, name FROM _migration ORDER BY version ASC")
        .await?;
    let applied: Vec<MigrationRecord> = result.take(0)?;
    let current = applied.iter().map(|m| m.version).max().unwrap_or(0);

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying migration"
        );
        db.query(migration.sql)
            .await?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name.to_string()))
            .await?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;
    }

    Ok(())
}

/// The initial schema DDL, exposed for inspection in tests.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
