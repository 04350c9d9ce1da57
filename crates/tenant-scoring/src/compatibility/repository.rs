use super::domain::{ApplicationId, OwnerId, PropertyId, PropertySnapshot, RentalApplication};
use super::preferences::ScoringPreferenceProfile;

/// Authoritative storage for owner rubrics. The engine only keeps a local snapshot.
pub trait PreferenceRepository: Send + Sync {
    fn get_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<ScoringPreferenceProfile>, RepositoryError>;
    fn persist(
        &self,
        owner_id: &OwnerId,
        profile: ScoringPreferenceProfile,
    ) -> Result<ScoringPreferenceProfile, RepositoryError>;
}

/// Read-only lookup of application snapshots.
pub trait ApplicationProvider: Send + Sync {
    fn get_by_id(&self, id: &ApplicationId) -> Result<Option<RentalApplication>, RepositoryError>;
}

/// Read-only lookup of property snapshots.
pub trait PropertyProvider: Send + Sync {
    fn get_by_id(&self, id: &PropertyId) -> Result<Option<PropertySnapshot>, RepositoryError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
