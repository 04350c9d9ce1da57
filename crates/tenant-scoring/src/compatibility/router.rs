use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, OwnerId, PropertyId};
use super::preferences::ScoringPreferenceProfile;
use super::repository::{
    ApplicationProvider, PreferenceRepository, PropertyProvider, RepositoryError,
};
use super::service::{CompatibilityService, ScoringServiceError};

/// Body of a single score request.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRequestBody {
    pub owner_id: OwnerId,
    pub application_id: ApplicationId,
    pub property_id: PropertyId,
}

/// Body of a batch score request against one property.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchScoreRequestBody {
    pub owner_id: OwnerId,
    pub property_id: PropertyId,
    pub application_ids: Vec<ApplicationId>,
}

/// Router builder exposing the preference and scoring endpoints.
pub fn scoring_router<R, A, P>(service: Arc<CompatibilityService<R, A, P>>) -> Router
where
    R: PreferenceRepository + 'static,
    A: ApplicationProvider + 'static,
    P: PropertyProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/scoring/preferences/:owner_id",
            get(get_preferences_handler::<R, A, P>).put(update_preferences_handler::<R, A, P>),
        )
        .route("/api/v1/scoring/score", post(score_handler::<R, A, P>))
        .route("/api/v1/scoring/batch", post(batch_handler::<R, A, P>))
        .route("/api/v1/scoring/cache", get(cache_stats_handler::<R, A, P>))
        .with_state(service)
}

pub(crate) async fn get_preferences_handler<R, A, P>(
    State(service): State<Arc<CompatibilityService<R, A, P>>>,
    Path(owner_id): Path<String>,
) -> Response
where
    R: PreferenceRepository + 'static,
    A: ApplicationProvider + 'static,
    P: PropertyProvider + 'static,
{
    match service.preferences(&OwnerId(owner_id)) {
        Ok(profile) => (StatusCode::OK, axum::Json(profile.as_ref().clone())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_preferences_handler<R, A, P>(
    State(service): State<Arc<CompatibilityService<R, A, P>>>,
    Path(owner_id): Path<String>,
    axum::Json(profile): axum::Json<ScoringPreferenceProfile>,
) -> Response
where
    R: PreferenceRepository + 'static,
    A: ApplicationProvider + 'static,
    P: PropertyProvider + 'static,
{
    match service.update_preferences(&OwnerId(owner_id), profile) {
        Ok(stored) => (StatusCode::OK, axum::Json(stored.as_ref().clone())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<R, A, P>(
    State(service): State<Arc<CompatibilityService<R, A, P>>>,
    axum::Json(request): axum::Json<ScoreRequestBody>,
) -> Response
where
    R: PreferenceRepository + 'static,
    A: ApplicationProvider + 'static,
    P: PropertyProvider + 'static,
{
    match service
        .score(
            &request.owner_id,
            &request.application_id,
            &request.property_id,
        )
        .await
    {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn batch_handler<R, A, P>(
    State(service): State<Arc<CompatibilityService<R, A, P>>>,
    axum::Json(request): axum::Json<BatchScoreRequestBody>,
) -> Response
where
    R: PreferenceRepository + 'static,
    A: ApplicationProvider + 'static,
    P: PropertyProvider + 'static,
{
    match service
        .score_batch(
            &request.owner_id,
            &request.property_id,
            &request.application_ids,
        )
        .await
    {
        Ok(results) => (StatusCode::OK, axum::Json(results)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cache_stats_handler<R, A, P>(
    State(service): State<Arc<CompatibilityService<R, A, P>>>,
) -> Response
where
    R: PreferenceRepository + 'static,
    A: ApplicationProvider + 'static,
    P: PropertyProvider + 'static,
{
    (StatusCode::OK, axum::Json(service.engine().cache_stats())).into_response()
}

fn error_response(error: ScoringServiceError) -> Response {
    let status = match &error {
        ScoringServiceError::PreferencesNotFound(_)
        | ScoringServiceError::UnknownApplication(_)
        | ScoringServiceError::UnknownProperty(_)
        | ScoringServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ScoringServiceError::StalePreferences { .. } => StatusCode::CONFLICT,
        ScoringServiceError::Preferences(_)
        | ScoringServiceError::Repository(_)
        | ScoringServiceError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
