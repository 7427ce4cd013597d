//! Per-attacker aggregate profile.
//!
//! The accumulation step lives here, on the model, so the
//! order-independence of concurrent updates can be tested without a
//! store behind it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::AttackKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackerProfile {
    /// Opaque attacker-side key, typically an IP.
    pub source_ip: String,
    pub total_attacks: u64,
    pub most_common_attack: AttackKind,
    pub average_risk: f64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Histogram over the attack-kind universe.
    pub attack_kinds: BTreeMap<String, u64>,
    pub services_targeted: BTreeSet<String>,
}

/// One observed event's contribution to a profile.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub source_ip: String,
    pub attack_kind: AttackKind,
    pub risk: f64,
    pub service: String,
    pub timestamp: DateTime<Utc>,
}

impl AttackerProfile {
    pub fn new(update: &ProfileUpdate) -> Self {
        let mut attack_kinds = BTreeMap::new();
        attack_kinds.insert(update.attack_kind.as_str().to_string(), 1);
        let mut services_targeted = BTreeSet::new();
        services_targeted.insert(update.service.clone());
        AttackerProfile {
            source_ip: update.source_ip.clone(),
            total_attacks: 1,
            most_common_attack: update.attack_kind,
            average_risk: update.risk,
            first_seen: update.timestamp,
            last_seen: update.timestamp,
            attack_kinds,
            services_targeted,
        }
    }

    /// Fold one more observation into the accumulator.
    ///
    /// Counts, histogram and service set are commutative; the running
    /// average depends only on the total; first/last seen are
    /// min/max. The end state of any interleaving therefore equals
    /// some serial order of the same updates.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        self.total_attacks += 1;
        *self
            .attack_kinds
            .entry(update.attack_kind.as_str().to_string())
            .or_insert(0) += 1;
        // Ties break toward the lexically smaller kind.
        if let Some((kind, _)) = self
            .attack_kinds
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        {
            self.most_common_attack = AttackKind::parse(kind);
        }
        let total = self.total_attacks as f64;
        self.average_risk = (self.average_risk * (total - 1.0) + update.risk) / total;
        self.first_seen = self.first_seen.min(update.timestamp);
        self.last_seen = self.last_seen.max(update.timestamp);
        self.services_targeted.insert(update.service.clone());
    }
}
