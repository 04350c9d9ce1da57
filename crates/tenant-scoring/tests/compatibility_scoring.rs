//! Integration scenarios for owner rubrics and compatibility scoring.
//!
//! Everything goes through the public service facade and HTTP router.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tenant_scoring::compatibility::{
        ApplicationId, ApplicationProvider, CompatibilityService, ContractType, DocumentChecklist,
        Guarantor, GuarantorKind, Household, OwnerId, PreferenceRepository, PropertyId,
        PropertyProvider, PropertySnapshot, RentalApplication, RepositoryError, ScoringEngine,
        ScoringPreferenceProfile, VerificationStatus,
    };
    use tenant_scoring::config::ScoringConfig;

    pub(super) fn documents() -> DocumentChecklist {
        DocumentChecklist {
            identity: true,
            income_proof: true,
            employment_proof: true,
            tax_notice: true,
            address_proof: true,
            cover_letter: false,
            verification: VerificationStatus::Verified,
        }
    }

    pub(super) fn applications() -> Vec<RentalApplication> {
        vec![
            RentalApplication {
                id: ApplicationId("APP-1".to_string()),
                monthly_income: Some(3300.0),
                contract_type: Some(ContractType::PermanentConfirmed),
                seniority_months: 30,
                in_trial_period: false,
                guarantor: None,
                documents: documents(),
                household: Household {
                    adults: 2,
                    children: 1,
                    earner_incomes: vec![1800.0, 1500.0],
                },
            },
            RentalApplication {
                id: ApplicationId("APP-2".to_string()),
                monthly_income: Some(2700.0),
                contract_type: Some(ContractType::Freelance),
                seniority_months: 14,
                in_trial_period: false,
                guarantor: Some(Guarantor {
                    kind: GuarantorKind::Individual,
                    monthly_income: Some(4200.0),
                }),
                documents: documents(),
                household: Household {
                    adults: 1,
                    children: 0,
                    earner_incomes: vec![2700.0],
                },
            },
        ]
    }

    pub(super) fn listing() -> PropertySnapshot {
        PropertySnapshot {
            id: PropertyId("A-201".to_string()),
            monthly_price: Some(1100.0),
            bedrooms: 2,
            surface_sqm: Some(58.0),
            max_occupants: None,
        }
    }

    #[derive(Default)]
    pub(super) struct Profiles {
        records: Mutex<HashMap<OwnerId, ScoringPreferenceProfile>>,
    }

    impl PreferenceRepository for Profiles {
        fn get_by_owner(
            &self,
            owner_id: &OwnerId,
        ) -> Result<Option<ScoringPreferenceProfile>, RepositoryError> {
            Ok(self
                .records
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
            self.records
                .lock()
                .expect("profiles mutex poisoned")
                .insert(owner_id.clone(), profile.clone());
            Ok(profile)
        }
    }

    pub(super) struct Applications(HashMap<ApplicationId, RentalApplication>);

    impl ApplicationProvider for Applications {
        fn get_by_id(
            &self,
            id: &ApplicationId,
        ) -> Result<Option<RentalApplication>, RepositoryError> {
            Ok(self.0.get(id).cloned())
        }
    }

    pub(super) struct Listings(HashMap<PropertyId, PropertySnapshot>);

    impl PropertyProvider for Listings {
        fn get_by_id(&self, id: &PropertyId) -> Result<Option<PropertySnapshot>, RepositoryError> {
            Ok(self.0.get(id).cloned())
        }
    }

    pub(super) type Service = CompatibilityService<Profiles, Applications, Listings>;

    pub(super) fn service() -> Arc<Service> {
        let engine = ScoringEngine::new(
            Arc::new(Profiles::default()),
            &ScoringConfig {
                cache_ttl: Duration::from_secs(120),
                debounce_delay: Duration::from_millis(5),
            },
        );
        let applications = applications()
            .into_iter()
            .map(|application| (application.id.clone(), application))
            .collect();
        let listing = listing();
        Arc::new(CompatibilityService::new(
            engine,
            Arc::new(Applications(applications)),
            Arc::new(Listings(HashMap::from([(listing.id.clone(), listing)]))),
        ))
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::task::JoinSet;
use tower::ServiceExt;

use tenant_scoring::compatibility::{
    scoring_router, ApplicationId, EventType, ModelType, OwnerId, PropertyId,
    ScoringPreferenceProfile,
};

use common::service;

fn owner(id: &str) -> OwnerId {
    OwnerId(id.to_string())
}

fn application(id: &str) -> ApplicationId {
    ApplicationId(id.to_string())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn owner_switching_to_strict_rubric_rescoring_reflects_new_version() {
    let service = service();
    let router = scoring_router(service.clone());
    let listing = PropertyId("A-201".to_string());

    let before = service
        .score(&owner("owner-a"), &application("APP-2"), &listing)
        .await
        .expect("score");
    assert_eq!(before.model_used, ModelType::Standard);
    assert_eq!(before.computed_at_version, 0);

    let strict = ScoringPreferenceProfile::preset(owner("owner-a"), ModelType::Strict, Utc::now());
    let response = router
        .clone()
        .oneshot(
            Request::put("/api/v1/scoring/preferences/owner-a")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&strict).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::post("/api/v1/scoring/score")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "owner_id": "owner-a",
                        "application_id": "APP-2",
                        "property_id": "A-201"
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let after = body_json(response).await;
    assert_eq!(after["model_used"], "strict");
    assert_eq!(after["computed_at_version"], 1);
    assert!(after["total_score"].as_u64().unwrap() <= u64::from(before.total_score));
}

#[tokio::test]
async fn rubric_updates_leave_other_owners_cache_untouched() {
    let service = service();
    let listing = PropertyId("A-201".to_string());

    for owner_id in ["owner-a", "owner-b"] {
        service
            .score(&owner(owner_id), &application("APP-1"), &listing)
            .await
            .expect("score");
    }
    assert_eq!(service.engine().cache_stats().entries, 2);

    let invalidated = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&invalidated);
    let subscription = service
        .engine()
        .subscribe(EventType::ScoresInvalidated, move |event| {
            sink.lock().expect("events mutex poisoned").push(event.clone());
        });

    let flexible =
        ScoringPreferenceProfile::preset(owner("owner-a"), ModelType::Flexible, Utc::now());
    service
        .update_preferences(&owner("owner-a"), flexible)
        .expect("update");
    subscription.unsubscribe();

    assert_eq!(service.engine().cache_stats().entries, 1);
    assert_eq!(invalidated.lock().expect("events mutex poisoned").len(), 1);

    let untouched = service
        .score(&owner("owner-b"), &application("APP-1"), &listing)
        .await
        .expect("score");
    assert_eq!(untouched.model_used, ModelType::Standard);
    assert_eq!(service.engine().cache_stats().hits, 1);
}

#[tokio::test]
async fn concurrent_batches_agree_with_single_scores() {
    let service = service();
    let listing = PropertyId("A-201".to_string());
    let ids = vec![application("APP-1"), application("APP-2")];

    let mut tasks = JoinSet::new();
    for _ in 0..4 {
        let service = service.clone();
        let listing = listing.clone();
        let ids = ids.clone();
        tasks.spawn(async move {
            service
                .score_batch(&owner("owner-c"), &listing, &ids)
                .await
        });
    }

    let mut batches = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        batches.push(joined.expect("task").expect("batch"));
    }

    let single = service
        .score(&owner("owner-c"), &application("APP-1"), &listing)
        .await
        .expect("score");
    for batch in &batches {
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[&application("APP-1")], single);
    }
}

#[tokio::test]
async fn unknown_application_in_batch_is_rejected() {
    let router = scoring_router(service());

    let response = router
        .oneshot(
            Request::post("/api/v1/scoring/batch")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "owner_id": "owner-a",
                        "property_id": "A-201",
                        "application_ids": ["APP-1", "APP-404"]
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "application APP-404 not found");
}
