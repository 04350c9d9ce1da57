use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::cache::{fingerprint, CacheKey, CacheStats, ScoreCache};
use super::calculator::{RubricCalculator, ScoreCalculator, ScoreResult};
use super::clock::{Clock, SystemClock};
use super::debounce::{DebounceError, DebounceScheduler};
use super::domain::{ApplicationId, OwnerId, PropertyId, PropertySnapshot, RentalApplication};
use super::events::{EventBus, EventType, ScoringEvent, Subscription};
use super::preferences::{
    ModelType, PreferenceError, PreferenceStore, PreferenceUpdate, ScoringPreferenceProfile,
};
use super::repository::PreferenceRepository;
use crate::config::ScoringConfig;

/// One item of a batch scoring call.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub owner_id: OwnerId,
    pub application: RentalApplication,
    pub property: PropertySnapshot,
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Debounce(#[from] DebounceError),
    #[error("scoring task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ComputationKey {
    owner_id: OwnerId,
    application_id: ApplicationId,
    property_id: PropertyId,
}

struct EngineParts<R> {
    store: PreferenceStore<R>,
    cache: ScoreCache,
    calculator: Arc<dyn ScoreCalculator>,
    scheduler: DebounceScheduler<ComputationKey, ScoreResult>,
    events: EventBus,
    clock: Arc<dyn Clock>,
}

/// Public surface of the compatibility engine: rubric edits, score requests and events.
pub struct ScoringEngine<R> {
    parts: Arc<EngineParts<R>>,
}

impl<R> Clone for ScoringEngine<R> {
    fn clone(&self) -> Self {
        Self {
            parts: Arc::clone(&self.parts),
        }
    }
}

impl<R> ScoringEngine<R>
where
    R: PreferenceRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: &ScoringConfig) -> Self {
        Self::with_parts(
            repository,
            config,
            Arc::new(RubricCalculator),
            Arc::new(SystemClock),
        )
    }

    /// Build an engine around a custom calculator and clock (virtual time in tests).
    pub fn with_parts(
        repository: Arc<R>,
        config: &ScoringConfig,
        calculator: Arc<dyn ScoreCalculator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let parts = EngineParts {
            store: PreferenceStore::new(repository, Arc::clone(&clock)),
            cache: ScoreCache::new(config.cache_ttl, Arc::clone(&clock)),
            calculator,
            scheduler: DebounceScheduler::new(config.debounce_delay),
            events: EventBus::new(),
            clock,
        };

        Self {
            parts: Arc::new(parts),
        }
    }

    pub fn subscribe<F>(&self, event_type: EventType, callback: F) -> Subscription
    where
        F: Fn(&ScoringEvent) + Send + Sync + 'static,
    {
        self.parts.events.subscribe(event_type, callback)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.parts.cache.stats()
    }

    /// Evict expired cache entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.parts.cache.purge_expired()
    }

    pub fn get_preferences(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<Arc<ScoringPreferenceProfile>>, PreferenceError> {
        self.parts.store.get(owner_id)
    }

    /// Replace an owner's rubric, evict their cached scores and broadcast the new version.
    pub fn update_preferences(
        &self,
        owner_id: &OwnerId,
        profile: ScoringPreferenceProfile,
    ) -> Result<PreferenceUpdate, PreferenceError> {
        let update = self.parts.store.update(owner_id, profile)?;

        if let PreferenceUpdate::Applied(stored) = &update {
            let evicted = self.parts.cache.invalidate_for_owner(owner_id);
            if evicted > 0 {
                self.parts.events.emit(&ScoringEvent::ScoresInvalidated {
                    owner_id: owner_id.clone(),
                    evicted,
                });
            }
            self.parts.events.emit(&ScoringEvent::PreferencesUpdated {
                owner_id: owner_id.clone(),
                version: stored.version,
            });
        }

        Ok(update)
    }

    /// Score one application against the owner's current rubric.
    ///
    /// Rubric lookup failures never surface as errors: a degraded, incompatible result
    /// is returned instead. Owners without a rubric are scored with the standard preset.
    pub async fn calculate_score(
        &self,
        application_id: &ApplicationId,
        application: RentalApplication,
        property: PropertySnapshot,
        owner_id: &OwnerId,
    ) -> Result<ScoreResult, ScoringError> {
        let preferences = match self.parts.store.get(owner_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => Arc::new(ScoringPreferenceProfile::preset(
                owner_id.clone(),
                ModelType::Standard,
                self.parts.clock.now(),
            )),
            Err(err) => {
                warn!(
                    owner_id = %owner_id,
                    error = %err,
                    "preferences unavailable; returning degraded score"
                );
                return Ok(ScoreResult::degraded(err));
            }
        };

        let cache_key = CacheKey {
            owner_id: owner_id.clone(),
            application_id: application_id.clone(),
            property_id: property.id.clone(),
        };
        let fingerprint = fingerprint(&application, &property);

        if let Some(hit) = self
            .parts
            .cache
            .get(&cache_key, preferences.version, &fingerprint)
        {
            debug!(owner_id = %owner_id, application_id = %application_id, "score cache hit");
            return Ok(hit);
        }

        let computation_key = ComputationKey {
            owner_id: cache_key.owner_id.clone(),
            application_id: cache_key.application_id.clone(),
            property_id: cache_key.property_id.clone(),
        };
        let version = preferences.version;
        let parts = Arc::clone(&self.parts);
        let job =
            move || parts.compute(cache_key, &application, &property, &preferences, fingerprint);

        Ok(self
            .parts
            .scheduler
            .schedule(computation_key, version, job)
            .await?)
    }

    /// Score every request independently; the map is keyed by application id.
    pub async fn calculate_scores(
        &self,
        requests: Vec<ScoreRequest>,
    ) -> Result<HashMap<ApplicationId, ScoreResult>, ScoringError> {
        let mut tasks = JoinSet::new();
        for request in requests {
            let engine = self.clone();
            tasks.spawn(async move {
                let application_id = request.application.id.clone();
                let result = engine
                    .calculate_score(
                        &application_id,
                        request.application,
                        request.property,
                        &request.owner_id,
                    )
                    .await;
                (application_id, result)
            });
        }

        let mut results = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (application_id, result) = joined?;
            results.insert(application_id, result?);
        }
        Ok(results)
    }
}

impl<R> EngineParts<R> {
    fn compute(
        &self,
        cache_key: CacheKey,
        application: &RentalApplication,
        property: &PropertySnapshot,
        preferences: &ScoringPreferenceProfile,
        fingerprint: String,
    ) -> ScoreResult {
        let result = self.calculator.score(application, property, preferences);
        debug!(
            owner_id = %cache_key.owner_id,
            application_id = %cache_key.application_id,
            total_score = result.total_score,
            version = preferences.version,
            "score calculated"
        );

        let entry = self
            .cache
            .entry(result.clone(), preferences.version, fingerprint);
        self.cache.put(cache_key.clone(), entry);

        self.events.emit(&ScoringEvent::ScoreCalculated {
            owner_id: cache_key.owner_id,
            application_id: cache_key.application_id,
            property_id: cache_key.property_id,
            result: result.clone(),
        });

        result
    }
}
