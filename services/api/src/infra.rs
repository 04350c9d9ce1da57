use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tenant_scoring::compatibility::{
    ApplicationId, ApplicationProvider, CompatibilityService, ContractType, DocumentChecklist,
    Guarantor, GuarantorKind, Household, ModelType, OwnerId, PreferenceRepository, PropertyId,
    PropertyProvider, PropertySnapshot, RentalApplication, RepositoryError, ScoringEngine,
    ScoringPreferenceProfile, VerificationStatus,
};
use tenant_scoring::config::ScoringConfig;

pub(crate) type ScoringService = CompatibilityService<
    InMemoryPreferenceRepository,
    InMemoryApplicationDirectory,
    InMemoryPropertyCatalog,
>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPreferenceRepository {
    profiles: Arc<Mutex<HashMap<OwnerId, ScoringPreferenceProfile>>>,
}

impl PreferenceRepository for InMemoryPreferenceRepository {
    fn get_by_owner(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<ScoringPreferenceProfile>, RepositoryError> {
        let guard = self.profiles.lock().map_err(|_| poisoned())?;
        Ok(guard.get(owner_id).cloned())
    }

    fn persist(
        &self,
        owner_id: &OwnerId,
        profile: ScoringPreferenceProfile,
    ) -> Result<ScoringPreferenceProfile, RepositoryError> {
        let mut guard = self.profiles.lock().map_err(|_| poisoned())?;
        guard.insert(owner_id.clone(), profile.clone());
        Ok(profile)
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("preference store lock poisoned".to_string())
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationDirectory {
    records: Arc<HashMap<ApplicationId, RentalApplication>>,
}

impl InMemoryApplicationDirectory {
    pub(crate) fn seeded() -> Self {
        Self {
            records: Arc::new(
                seed_applications()
                    .into_iter()
                    .map(|application| (application.id.clone(), application))
                    .collect(),
            ),
        }
    }

    pub(crate) fn ids(&self) -> Vec<ApplicationId> {
        let mut ids: Vec<ApplicationId> = self.records.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl ApplicationProvider for InMemoryApplicationDirectory {
    fn get_by_id(&self, id: &ApplicationId) -> Result<Option<RentalApplication>, RepositoryError> {
        Ok(self.records.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPropertyCatalog {
    records: Arc<HashMap<PropertyId, PropertySnapshot>>,
}

impl InMemoryPropertyCatalog {
    pub(crate) fn seeded() -> Self {
        Self {
            records: Arc::new(
                seed_properties()
                    .into_iter()
                    .map(|property| (property.id.clone(), property))
                    .collect(),
            ),
        }
    }
}

impl PropertyProvider for InMemoryPropertyCatalog {
    fn get_by_id(&self, id: &PropertyId) -> Result<Option<PropertySnapshot>, RepositoryError> {
        Ok(self.records.get(id).cloned())
    }
}

/// Service over the seeded in-memory collaborators.
pub(crate) fn build_scoring_service(
    config: &ScoringConfig,
) -> (Arc<ScoringService>, InMemoryApplicationDirectory) {
    let applications = InMemoryApplicationDirectory::seeded();
    let engine = ScoringEngine::new(Arc::new(InMemoryPreferenceRepository::default()), config);
    let service = CompatibilityService::new(
        engine,
        Arc::new(applications.clone()),
        Arc::new(InMemoryPropertyCatalog::seeded()),
    );
    (Arc::new(service), applications)
}

pub(crate) fn parse_model_type(raw: &str) -> Result<ModelType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(ModelType::Strict),
        "standard" => Ok(ModelType::Standard),
        "flexible" => Ok(ModelType::Flexible),
        other => Err(format!(
            "unknown scoring model '{other}' (expected strict, standard or flexible)"
        )),
    }
}

fn complete_file(verification: VerificationStatus) -> DocumentChecklist {
    DocumentChecklist {
        identity: true,
        income_proof: true,
        employment_proof: true,
        tax_notice: true,
        address_proof: true,
        cover_letter: true,
        verification,
    }
}

pub(crate) fn seed_applications() -> Vec<RentalApplication> {
    vec![
        RentalApplication {
            id: ApplicationId("APP-1001".to_string()),
            monthly_income: Some(3900.0),
            contract_type: Some(ContractType::PermanentConfirmed),
            seniority_months: 40,
            in_trial_period: false,
            guarantor: None,
            documents: complete_file(VerificationStatus::Verified),
            household: Household {
                adults: 2,
                children: 0,
                earner_incomes: vec![2100.0, 1800.0],
            },
        },
        RentalApplication {
            id: ApplicationId("APP-1002".to_string()),
            monthly_income: Some(2600.0),
            contract_type: Some(ContractType::FixedTermLong),
            seniority_months: 8,
            in_trial_period: false,
            guarantor: Some(Guarantor {
                kind: GuarantorKind::PublicScheme,
                monthly_income: None,
            }),
            documents: complete_file(VerificationStatus::Partial),
            household: Household {
                adults: 1,
                children: 1,
                earner_incomes: vec![2600.0],
            },
        },
        RentalApplication {
            id: ApplicationId("APP-1003".to_string()),
            monthly_income: Some(1900.0),
            contract_type: Some(ContractType::Student),
            seniority_months: 0,
            in_trial_period: false,
            guarantor: None,
            documents: DocumentChecklist {
                tax_notice: false,
                cover_letter: false,
                ..complete_file(VerificationStatus::Unverified)
            },
            household: Household {
                adults: 1,
                children: 0,
                earner_incomes: Vec::new(),
            },
        },
    ]
}

pub(crate) fn seed_properties() -> Vec<PropertySnapshot> {
    vec![
        PropertySnapshot {
            id: PropertyId("A-201".to_string()),
            monthly_price: Some(1180.0),
            bedrooms: 2,
            surface_sqm: Some(52.0),
            max_occupants: None,
        },
        PropertySnapshot {
            id: PropertyId("B-014".to_string()),
            monthly_price: Some(760.0),
            bedrooms: 1,
            surface_sqm: Some(28.0),
            max_occupants: Some(2),
        },
    ]
}
