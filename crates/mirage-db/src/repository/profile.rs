//! SurrealDB implementation of [`ProfileRepository`].
//!
//! The record id is the source identifier. Serialisation of
//! concurrent read-modify-write cycles is the aggregator's job; this
//! layer only does whole-document reads and upserts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use mirage_core::error::MirageResult;
use mirage_core::models::event::AttackKind;
use mirage_core::models::profile::AttackerProfile;
use mirage_core::repository::ProfileRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ProfileRow {
    source_ip: String,
    total_attacks: u64,
    most_common_attack: String,
    average_risk: f64,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    attack_kinds: BTreeMap<String, u64>,
    services_targeted: Vec<String>,
}

impl From<&AttackerProfile> for ProfileRow {
    fn from(p: &AttackerProfile) -> Self {
        ProfileRow {
            source_ip: p.source_ip.clone(),
            total_attacks: p.total_attacks,
            most_common_attack: p.most_common_attack.as_str().to_string(),
            average_risk: p.average_risk,
            first_seen: p.first_seen,
            last_seen: p.last_seen,
            attack_kinds: p.attack_kinds.clone(),
            services_targeted: p.services_targeted.iter().cloned().collect(),
        }
    }
}

impl ProfileRow {
    fn into_profile(self) -> AttackerProfile {
        AttackerProfile {
            source_ip: self.source_ip,
            total_attacks: self.total_attacks,
            most_common_attack: AttackKind::parse(&self.most_common_attack),
            average_risk: self.average_risk,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            attack_kinds: self.attack_kinds,
            services_targeted: self.services_targeted.into_iter().collect::<BTreeSet<_>>(),
        }
    }
}

/// SurrealDB implementation of the attacker-profile repository.
#[derive(Clone)]
pub struct SurrealProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ProfileRepository for SurrealProfileRepository<C> {
    async fn get(&self, source_ip: &str) -> MirageResult<Option<AttackerProfile>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('attacker_profile', $id)")
            .bind(("id", source_ip.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ProfileRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next().map(ProfileRow::into_profile))
    }

    async fn put(&self, profile: &AttackerProfile) -> MirageResult<()> {
        self.db
            .query("UPSERT type::record('attacker_profile', $id) CONTENT $data")
            .bind(("id", profile.source_ip.clone()))
            .bind(("data", ProfileRow::from(profile)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;
        Ok(())
    }
}
