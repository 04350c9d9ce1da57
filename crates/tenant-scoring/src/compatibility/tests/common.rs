use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::compatibility::clock::{Clock, ManualClock};
use crate::compatibility::domain::{
    ApplicationId, ContractType, DocumentChecklist, Household, OwnerId, PropertyId,
    PropertySnapshot, RentalApplication, VerificationStatus,
};
use crate::compatibility::preferences::{ModelType, ScoringPreferenceProfile};
use crate::compatibility::repository::{
    ApplicationProvider, PreferenceRepository, PropertyProvider, RepositoryError,
};
use crate::compatibility::{
    CompatibilityService, RubricCalculator, ScoreCalculator, ScoreResult, ScoringEngine,
};
use crate::config::ScoringConfig;

pub(super) fn owner() -> OwnerId {
    OwnerId("owner-1".to_string())
}

pub(super) fn start() -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000, 0).expect("valid timestamp")
}

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig {
        cache_ttl: Duration::from_secs(300),
        debounce_delay: Duration::from_millis(100),
    }
}

pub(super) fn standard_profile() -> ScoringPreferenceProfile {
    ScoringPreferenceProfile::preset(owner(), ModelType::Standard, start())
}

/// Salaried applicant earning exactly three times the rent of [`property`].
pub(super) fn application() -> RentalApplication {
    RentalApplication {
        id: ApplicationId("app-1".to_string()),
        monthly_income: Some(3000.0),
        contract_type: Some(ContractType::PermanentConfirmed),
        seniority_months: 24,
        in_trial_period: false,
        guarantor: None,
        documents: DocumentChecklist {
            identity: true,
            income_proof: true,
            employment_proof: true,
            tax_notice: true,
            address_proof: true,
            cover_letter: true,
            verification: VerificationStatus::Verified,
        },
        household: Household {
            adults: 1,
            children: 0,
            earner_incomes: vec![3000.0],
        },
    }
}

pub(super) fn application_with_id(id: &str) -> RentalApplication {
    RentalApplication {
        id: ApplicationId(id.to_string()),
        ..application()
    }
}

/// Unemployed applicant at ratio 2.0 with no guarantor.
pub(super) fn risky_application() -> RentalApplication {
    RentalApplication {
        id: ApplicationId("app-risky".to_string()),
        monthly_income: Some(2000.0),
        contract_type: Some(ContractType::Unemployed),
        seniority_months: 0,
        household: Household {
            adults: 1,
            children: 0,
            earner_incomes: vec![2000.0],
        },
        ..application()
    }
}

pub(super) fn property() -> PropertySnapshot {
    PropertySnapshot {
        id: PropertyId("prop-1".to_string()),
        monthly_price: Some(1000.0),
        bedrooms: 2,
        surface_sqm: Some(45.0),
        max_occupants: None,
    }
}

pub(super) fn score(
    application: &RentalApplication,
    preferences: &ScoringPreferenceProfile,
) -> ScoreResult {
    RubricCalculator.score(application, &property(), preferences)
}

#[derive(Default)]
pub(super) struct MemoryPreferenceRepository {
    profiles: Arc<Mutex<HashMap<OwnerId, ScoringPreferenceProfile>>>,
}

impl MemoryPreferenceRepository {
    pub(super) fn with_profile(profile: ScoringPreferenceProfile) -> Self {
        let repository = Self::default();
        repository
            .profiles
            .lock()
            .expect("profiles mutex poisoned")
            .insert(profile.owner_id.clone(), profile);
        repository
    }

    pub(super) fn stored_version(&self, owner_id: &OwnerId) -> Option<u64> {
        self.profiles
            .lock()
            .expect("profiles mutex poisoned")
            .get(owner_id)
            .map(|profile| profile.version)
    }
}

impl PreferenceRepository for MemoryPreferenceRepository {
    fn get_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<ScoringPreferenceProfile>, RepositoryError> {
        Ok(self
            .profiles
            .lock()
            .expect("profiles mutex poisoned")
            .get(owner_id)
            .cloned())
    }

    fn persist(
        &self,
        owner_id: &OwnerId,
        profile: ScoringPreferenceProfile,
    ) -> Result<ScoringPreferenceProfile, RepositoryError> {
        self.profiles
            .lock()
            .expect("profiles mutex poisoned")
            .insert(owner_id.clone(), profile.clone());
        Ok(profile)
    }
}

pub(super) struct UnavailablePreferenceRepository;

impl PreferenceRepository for UnavailablePreferenceRepository {
    fn get_by_owner(
        &self,
        _owner_id: &OwnerId,
    ) -> Result<Option<ScoringPreferenceProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn persist(
        &self,
        _owner_id: &OwnerId,
        _profile: ScoringPreferenceProfile,
    ) -> Result<ScoringPreferenceProfile, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Rubric calculator that records how often it ran and the last income it saw.
#[derive(Default)]
pub(super) struct CountingCalculator {
    calls: AtomicUsize,
    last_income: Mutex<Option<f64>>,
}

impl CountingCalculator {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_income(&self) -> Option<f64> {
        *self.last_income.lock().expect("income mutex poisoned")
    }
}

impl ScoreCalculator for CountingCalculator {
    fn score(
        &self,
        application: &RentalApplication,
        property: &PropertySnapshot,
        preferences: &ScoringPreferenceProfile,
    ) -> ScoreResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_income.lock().expect("income mutex poisoned") = application.monthly_income;
        RubricCalculator.score(application, property, preferences)
    }
}

pub(super) struct EngineHarness<R> {
    pub engine: ScoringEngine<R>,
    pub repository: Arc<R>,
    pub calculator: Arc<CountingCalculator>,
    pub clock: Arc<ManualClock>,
}

pub(super) fn harness<R>(repository: R) -> EngineHarness<R>
where
    R: PreferenceRepository + 'static,
{
    let repository = Arc::new(repository);
    let calculator = Arc::new(CountingCalculator::default());
    let clock = Arc::new(ManualClock::new(start()));
    let engine = ScoringEngine::with_parts(
        Arc::clone(&repository),
        &scoring_config(),
        calculator.clone() as Arc<dyn ScoreCalculator>,
        clock.clone() as Arc<dyn Clock>,
    );

    EngineHarness {
        engine,
        repository,
        calculator,
        clock,
    }
}

#[derive(Default)]
pub(super) struct MemoryApplications {
    records: HashMap<ApplicationId, RentalApplication>,
}

impl MemoryApplications {
    pub(super) fn with(applications: Vec<RentalApplication>) -> Self {
        Self {
            records: applications
                .into_iter()
                .map(|application| (application.id.clone(), application))
                .collect(),
        }
    }
}

impl ApplicationProvider for MemoryApplications {
    fn get_by_id(&self, id: &ApplicationId) -> Result<Option<RentalApplication>, RepositoryError> {
        Ok(self.records.get(id).cloned())
    }
}

pub(super) struct MemoryProperties {
    records: HashMap<PropertyId, PropertySnapshot>,
}

impl Default for MemoryProperties {
    fn default() -> Self {
        let listing = property();
        Self {
            records: HashMap::from([(listing.id.clone(), listing)]),
        }
    }
}

impl PropertyProvider for MemoryProperties {
    fn get_by_id(&self, id: &PropertyId) -> Result<Option<PropertySnapshot>, RepositoryError> {
        Ok(self.records.get(id).cloned())
    }
}

pub(super) type TestService =
    CompatibilityService<MemoryPreferenceRepository, MemoryApplications, MemoryProperties>;

pub(super) fn build_service() -> Arc<TestService> {
    let engine = ScoringEngine::new(
        Arc::new(MemoryPreferenceRepository::default()),
        &ScoringConfig {
            cache_ttl: Duration::from_secs(300),
            debounce_delay: Duration::from_millis(1),
        },
    );
    Arc::new(CompatibilityService::new(
        engine,
        Arc::new(MemoryApplications::with(vec![
            application(),
            risky_application(),
        ])),
        Arc::new(MemoryProperties::default()),
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}
