use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::ScoringPreferenceProfile;
use crate::compatibility::clock::Clock;
use crate::compatibility::domain::OwnerId;
use crate::compatibility::repository::{PreferenceRepository, RepositoryError};

/// Result of a rubric replacement.
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceUpdate {
    Applied(Arc<ScoringPreferenceProfile>),
    /// The incoming profile was edited from an older version than the one stored.
    Stale {
        current: Arc<ScoringPreferenceProfile>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Local, versioned snapshot of every owner's rubric layered over the repository.
pub struct PreferenceStore<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
    snapshots: Mutex<HashMap<OwnerId, Arc<ScoringPreferenceProfile>>>,
    /// Serializes writers and holds the last version handed out.
    last_version: Mutex<u64>,
}

impl<R> PreferenceStore<R>
where
    R: PreferenceRepository,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            snapshots: Mutex::new(HashMap::new()),
            last_version: Mutex::new(0),
        }
    }

    /// Snapshot lookup that falls back to the repository once; failures are not retried.
    pub fn get(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<Arc<ScoringPreferenceProfile>>, PreferenceError> {
        if let Some(profile) = self.snapshot(owner_id) {
            return Ok(Some(profile));
        }

        let Some(fetched) = self.repository.get_by_owner(owner_id)? else {
            return Ok(None);
        };
        debug!(owner_id = %owner_id, version = fetched.version, "loaded preferences from repository");

        let mut snapshots = self.snapshots.lock().unwrap_or_else(PoisonError::into_inner);
        let installed = match snapshots.get(owner_id) {
            Some(existing) if existing.version >= fetched.version => existing.clone(),
            _ => {
                let profile = Arc::new(fetched);
                snapshots.insert(owner_id.clone(), profile.clone());
                profile
            }
        };
        Ok(Some(installed))
    }

    /// Local snapshot only, never touching the repository.
    pub fn snapshot(&self, owner_id: &OwnerId) -> Option<Arc<ScoringPreferenceProfile>> {
        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(owner_id)
            .cloned()
    }

    pub fn current_version(&self, owner_id: &OwnerId) -> Option<u64> {
        self.snapshot(owner_id).map(|profile| profile.version)
    }

    /// Replace an owner's rubric. The snapshot is swapped only after the repository accepted it.
    pub fn update(
        &self,
        owner_id: &OwnerId,
        mut profile: ScoringPreferenceProfile,
    ) -> Result<PreferenceUpdate, PreferenceError> {
        let mut last_version = self
            .last_version
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let current = self.get(owner_id)?;
        if let Some(current) = &current {
            if profile.version < current.version {
                debug!(
                    owner_id = %owner_id,
                    incoming = profile.version,
                    stored = current.version,
                    "rejecting stale preference update"
                );
                return Ok(PreferenceUpdate::Stale {
                    current: current.clone(),
                });
            }
        }

        let floor = current.as_ref().map_or(0, |profile| profile.version);
        let next_version = (*last_version).max(floor) + 1;
        let now = self.clock.now();

        profile.version = next_version;
        profile.owner_id = owner_id.clone();
        profile.updated_at = now;
        if let Some(current) = &current {
            profile.created_at = current.created_at;
        }

        let mut stored = self.repository.persist(owner_id, profile)?;
        if stored.version < next_version {
            warn!(
                owner_id = %owner_id,
                persisted = stored.version,
                assigned = next_version,
                "repository returned an older version; keeping the assigned one"
            );
            stored.version = next_version;
        }
        let stored = Arc::new(stored);
        *last_version = stored.version;

        self.snapshots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner_id.clone(), stored.clone());

        info!(owner_id = %owner_id, version = stored.version, "preferences updated");
        Ok(PreferenceUpdate::Applied(stored))
    }
}
