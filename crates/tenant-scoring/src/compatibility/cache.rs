use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::calculator::ScoreResult;
use super::clock::Clock;
use super::domain::{ApplicationId, OwnerId, PropertyId, PropertySnapshot, RentalApplication};

/// Cache slot identity. Entries are namespaced by owner so eviction can be per owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub owner_id: OwnerId,
    pub application_id: ApplicationId,
    pub property_id: PropertyId,
}

/// Memoized result plus the facts needed to decide whether it is still valid.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: ScoreResult,
    pub stored_at: DateTime<Utc>,
    pub version: u64,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// SHA-256 digest over the exact applicant and property inputs.
pub fn fingerprint(application: &RentalApplication, property: &PropertySnapshot) -> String {
    let payload = serde_json::to_vec(&(application, property))
        .unwrap_or_else(|_| format!("{application:?}|{property:?}").into_bytes());
    hex::encode(Sha256::digest(&payload))
}

type OwnerEntries = HashMap<(ApplicationId, PropertyId), CacheEntry>;

/// In-process score memo validated by rubric version, input fingerprint and age.
pub struct ScoreCache {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<OwnerId, OwnerEntries>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ScoreCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            clock,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Stamp a result for storage with the current clock reading.
    pub fn entry(&self, result: ScoreResult, version: u64, fingerprint: String) -> CacheEntry {
        CacheEntry {
            result,
            stored_at: self.clock.now(),
            version,
            fingerprint,
        }
    }

    /// Return the stored result only while it matches the current version and inputs and is younger than the TTL.
    pub fn get(
        &self,
        key: &CacheKey,
        current_version: u64,
        fingerprint: &str,
    ) -> Option<ScoreResult> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .get(&key.owner_id)
            .and_then(|owned| owned.get(&(key.application_id.clone(), key.property_id.clone())));

        let Some(entry) = entry else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let staleness = if entry.version != current_version {
            Some("version")
        } else if entry.fingerprint != fingerprint {
            Some("fingerprint")
        } else if now - entry.stored_at >= self.ttl {
            Some("expired")
        } else {
            None
        };

        match staleness {
            Some(reason) => {
                debug!(
                    owner_id = %key.owner_id,
                    application_id = %key.application_id,
                    reason,
                    stored_version = entry.version,
                    current_version,
                    "cached score is stale"
                );
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.result.clone())
            }
        }
    }

    pub fn put(&self, key: CacheKey, entry: CacheEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(key.owner_id)
            .or_default()
            .insert((key.application_id, key.property_id), entry);
    }

    /// Drop every entry of one owner, returning how many were evicted.
    pub fn invalidate_for_owner(&self, owner_id: &OwnerId) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(owner_id).map_or(0, |owned| owned.len())
    }

    /// Drop every entry whose age reached the TTL.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut evicted = 0;
        entries.retain(|_, owned| {
            let before = owned.len();
            owned.retain(|_, entry| now - entry.stored_at < ttl);
            evicted += before - owned.len();
            !owned.is_empty()
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
