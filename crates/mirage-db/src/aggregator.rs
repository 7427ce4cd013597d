//! Per-attacker profile aggregation.
//!
//! The contract is observational serialisability per source
//! identifier: the final profile must equal some serial order of the
//! concurrent updates. Updates go through an async mutex per source
//! identifier in front of a plain read-modify-write against the
//! profile repository.

use std::collections::HashMap;
use std::sync::Arc;

use mirage_core::error::MirageResult;
use mirage_core::models::profile::{AttackerProfile, ProfileUpdate};
use mirage_core::repository::ProfileRepository;
use tokio::sync::Mutex;

/// Serialises profile updates per source identifier.
///
/// The lock table is bounded by the universe of distinct source
/// identifiers seen by this process.
pub struct ProfileAggregator<P: ProfileRepository> {
    repo: P,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<P: ProfileRepository> ProfileAggregator<P> {
    pub fn new(repo: P) -> Self {
        Self {
            repo,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut table = self.locks.lock().await;
        table
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fold one observation into the attacker's profile.
    pub async fn record(&self, update: ProfileUpdate) -> MirageResult<AttackerProfile> {
        let lock = self.key_lock(&update.source_ip).await;
        let _guard = lock.lock().await;

        let profile = match self.repo.get(&update.source_ip).await? {
            Some(mut existing) => {
                existing.apply(&update);
                existing
            }
            None => AttackerProfile::new(&update),
        };

        self.repo.put(&profile).await?;
        Ok(profile)
    }
}
