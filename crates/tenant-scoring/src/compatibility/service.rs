use std::collections::BTreeMap;
use std::sync::Arc;

use super::calculator::ScoreResult;
use super::domain::{ApplicationId, OwnerId, PropertyId, PropertySnapshot, RentalApplication};
use super::engine::{ScoreRequest, ScoringEngine, ScoringError};
use super::preferences::{PreferenceError, PreferenceUpdate, ScoringPreferenceProfile};
use super::repository::{
    ApplicationProvider, PreferenceRepository, PropertyProvider, RepositoryError,
};

/// Service resolving records by id before handing them to the scoring engine.
pub struct CompatibilityService<R, A, P> {
    engine: ScoringEngine<R>,
    applications: Arc<A>,
    properties: Arc<P>,
}

impl<R, A, P> CompatibilityService<R, A, P>
where
    R: PreferenceRepository + 'static,
    A: ApplicationProvider + 'static,
    P: PropertyProvider + 'static,
{
    pub fn new(engine: ScoringEngine<R>, applications: Arc<A>, properties: Arc<P>) -> Self {
        Self {
            engine,
            applications,
            properties,
        }
    }

    pub fn engine(&self) -> &ScoringEngine<R> {
        &self.engine
    }

    pub fn preferences(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Arc<ScoringPreferenceProfile>, ScoringServiceError> {
        self.engine
            .get_preferences(owner_id)?
            .ok_or_else(|| ScoringServiceError::PreferencesNotFound(owner_id.clone()))
    }

    /// Replace an owner's rubric; edits based on an outdated version are refused.
    pub fn update_preferences(
        &self,
        owner_id: &OwnerId,
        profile: ScoringPreferenceProfile,
    ) -> Result<Arc<ScoringPreferenceProfile>, ScoringServiceError> {
        match self.engine.update_preferences(owner_id, profile)? {
            PreferenceUpdate::Applied(stored) => Ok(stored),
            PreferenceUpdate::Stale { current } => Err(ScoringServiceError::StalePreferences {
                current_version: current.version,
            }),
        }
    }

    pub async fn score(
        &self,
        owner_id: &OwnerId,
        application_id: &ApplicationId,
        property_id: &PropertyId,
    ) -> Result<ScoreResult, ScoringServiceError> {
        let application = self.application(application_id)?;
        let property = self.property(property_id)?;

        let result = self
            .engine
            .calculate_score(application_id, application, property, owner_id)
            .await?;
        Ok(result)
    }

    /// Score several applications for one property.
    pub async fn score_batch(
        &self,
        owner_id: &OwnerId,
        property_id: &PropertyId,
        application_ids: &[ApplicationId],
    ) -> Result<BTreeMap<ApplicationId, ScoreResult>, ScoringServiceError> {
        let property = self.property(property_id)?;
        let requests = application_ids
            .iter()
            .map(|application_id| {
                Ok(ScoreRequest {
                    owner_id: owner_id.clone(),
                    application: self.application(application_id)?,
                    property: property.clone(),
                })
            })
            .collect::<Result<Vec<_>, ScoringServiceError>>()?;

        let results = self.engine.calculate_scores(requests).await?;
        Ok(results.into_iter().collect())
    }

    fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<RentalApplication, ScoringServiceError> {
        self.applications
            .get_by_id(application_id)?
            .ok_or_else(|| ScoringServiceError::UnknownApplication(application_id.clone()))
    }

    fn property(&self, property_id: &PropertyId) -> Result<PropertySnapshot, ScoringServiceError> {
        self.properties
            .get_by_id(property_id)?
            .ok_or_else(|| ScoringServiceError::UnknownProperty(property_id.clone()))
    }
}

/// Error raised by the compatibility service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error("no scoring preferences for owner {0}")]
    PreferencesNotFound(OwnerId),
    #[error("preference update is based on an outdated version (stored version {current_version})")]
    StalePreferences { current_version: u64 },
    #[error("application {0} not found")]
    UnknownApplication(ApplicationId),
    #[error("property {0} not found")]
    UnknownProperty(PropertyId),
    #[error(transparent)]
    Preferences(#[from] PreferenceError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
