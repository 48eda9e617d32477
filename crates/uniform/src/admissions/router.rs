use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde_json::json;

use super::auth::{AuthError, AuthenticatedCaller, TokenVerifier};
use super::domain::{ApplicationId, InstitutionId};
use super::register::{
    ApplicationQuery, ApplicationRegister, ApplicationView, RegisterError, SubmitRequest,
};
use super::repository::AdmissionStore;
use super::review::{ApprovalDetails, ReviewError, ReviewWorkflow};

/// Shared handler state: intake facade, review facade, and token verifier.
pub struct AdmissionState<S, V> {
    pub register: Arc<ApplicationRegister<S>>,
    pub review: Arc<ReviewWorkflow<S>>,
    pub verifier: Arc<V>,
}

impl<S, V> Clone for AdmissionState<S, V> {
    fn clone(&self) -> Self {
        Self {
            register: self.register.clone(),
            review: self.review.clone(),
            verifier: self.verifier.clone(),
        }
    }
}

/// Router builder exposing the admission HTTP endpoints.
pub fn admission_router<S, V>(state: AdmissionState<S, V>) -> Router
where
    S: AdmissionStore + 'static,
    V: TokenVerifier + 'static,
{
    Router::new()
        .route(
            "/api/applications",
            post(submit_handler::<S, V>).get(list_handler::<S, V>),
        )
        .route(
            "/api/applications/:application_id",
            get(detail_handler::<S, V>).delete(cancel_handler::<S, V>),
        )
        .route(
            "/api/applications/:application_id/approve",
            patch(approve_handler::<S, V>),
        )
        .route(
            "/api/institutions/:institution_id/units",
            get(units_handler::<S, V>),
        )
        .with_state(state)
}

pub(crate) async fn submit_handler<S, V>(
    State(state): State<AdmissionState<S, V>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<SubmitRequest>,
) -> Response
where
    S: AdmissionStore + 'static,
    V: TokenVerifier + 'static,
{
    let caller = match authenticate(state.verifier.as_ref(), &headers) {
        Ok(caller) => caller,
        Err(error) => return auth_error_response(error),
    };

    match state.register.submit(&caller, request) {
        Ok(application) => {
            (StatusCode::CREATED, axum::Json(ApplicationView::of(&application))).into_response()
        }
        Err(error) => register_error_response(error),
    }
}

pub(crate) async fn list_handler<S, V>(
    State(state): State<AdmissionState<S, V>>,
    headers: HeaderMap,
    Query(query): Query<ApplicationQuery>,
) -> Response
where
    S: AdmissionStore + 'static,
    V: TokenVerifier + 'static,
{
    let caller = match authenticate(state.verifier.as_ref(), &headers) {
        Ok(caller) => caller,
        Err(error) => return auth_error_response(error),
    };

    match state.register.list(&caller, &query) {
        Ok(groups) => (StatusCode::OK, axum::Json(groups)).into_response(),
        Err(error) => register_error_response(error),
    }
}

pub(crate) async fn detail_handler<S, V>(
    State(state): State<AdmissionState<S, V>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
    V: TokenVerifier + 'static,
{
    let caller = match authenticate(state.verifier.as_ref(), &headers) {
        Ok(caller) => caller,
        Err(error) => return auth_error_response(error),
    };

    match state
        .register
        .detail(&caller, &ApplicationId(application_id))
    {
        Ok(detail) => (StatusCode::OK, axum::Json(detail)).into_response(),
        Err(error) => register_error_response(error),
    }
}

pub(crate) async fn approve_handler<S, V>(
    State(state): State<AdmissionState<S, V>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(details): axum::Json<ApprovalDetails>,
) -> Response
where
    S: AdmissionStore + 'static,
    V: TokenVerifier + 'static,
{
    let caller = match authenticate(state.verifier.as_ref(), &headers) {
        Ok(caller) => caller,
        Err(error) => return auth_error_response(error),
    };

    match state
        .review
        .approve(&caller, &ApplicationId(application_id), details)
    {
        Ok(application) => {
            (StatusCode::OK, axum::Json(ApplicationView::of(&application))).into_response()
        }
        Err(error) => review_error_response(error),
    }
}

pub(crate) async fn cancel_handler<S, V>(
    State(state): State<AdmissionState<S, V>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
    V: TokenVerifier + 'static,
{
    let caller = match authenticate(state.verifier.as_ref(), &headers) {
        Ok(caller) => caller,
        Err(error) => return auth_error_response(error),
    };

    match state.review.cancel(&caller, &ApplicationId(application_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => review_error_response(error),
    }
}

pub(crate) async fn units_handler<S, V>(
    State(state): State<AdmissionState<S, V>>,
    headers: HeaderMap,
    Path(institution_id): Path<String>,
) -> Response
where
    S: AdmissionStore + 'static,
    V: TokenVerifier + 'static,
{
    let caller = match authenticate(state.verifier.as_ref(), &headers) {
        Ok(caller) => caller,
        Err(error) => return auth_error_response(error),
    };

    match state
        .register
        .eligible_units(&caller, &InstitutionId(institution_id))
    {
        Ok(listings) => (StatusCode::OK, axum::Json(listings)).into_response(),
        Err(error) => register_error_response(error),
    }
}

fn authenticate<V: TokenVerifier>(
    verifier: &V,
    headers: &HeaderMap,
) -> Result<AuthenticatedCaller, AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredentials)?;
    verifier.verify(token.trim())
}

fn auth_error_response(error: AuthError) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response()
}

fn register_error_response(error: RegisterError) -> Response {
    let status = match &error {
        RegisterError::UnitNotFound
        | RegisterError::InstitutionNotFound
        | RegisterError::StudentNotFound
        | RegisterError::ApplicationNotFound => StatusCode::NOT_FOUND,
        RegisterError::UnitClosed(_) | RegisterError::NotEligible => StatusCode::BAD_REQUEST,
        RegisterError::DuplicateApplication => StatusCode::CONFLICT,
        RegisterError::Forbidden => StatusCode::FORBIDDEN,
        RegisterError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return internal_error_response(&error);
    }
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

fn review_error_response(error: ReviewError) -> Response {
    let status = match &error {
        ReviewError::NotFound => StatusCode::NOT_FOUND,
        ReviewError::AlreadyReviewed => StatusCode::CONFLICT,
        ReviewError::Forbidden => StatusCode::FORBIDDEN,
        ReviewError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        return internal_error_response(&error);
    }
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

// Store failures are logged server-side and returned as a generic body so
// database details never leak to clients.
fn internal_error_response(error: &dyn std::error::Error) -> Response {
    tracing::error!(%error, "admission store failure");
    let payload = json!({ "error": "internal error" });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
