//! REST endpoints for the onboarding wizard.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::backend::PhotoUpload;

use super::model::FieldUpdate;
use super::wizard::OnboardingWizard;

/// Header carrying the original file name of an uploaded photo.
pub const FILE_NAME_HEADER: &str = "x-file-name";

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub wizard: Arc<OnboardingWizard>,
}

/// GET /api/onboarding
async fn get_wizard(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.wizard.snapshot().await)
}

/// POST /api/onboarding/next
async fn next_step(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    let outcome = state.wizard.next_step().await;
    Json(serde_json::json!({
        "outcome": outcome,
        "wizard": state.wizard.snapshot().await,
    }))
}

/// POST /api/onboarding/prev
async fn prev_step(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    state.wizard.prev_step().await;
    Json(state.wizard.snapshot().await)
}

/// POST /api/onboarding/field
///
/// Body: `{"field": "name", "value": "Sam"}`.
async fn update_field(
    State(state): State<OnboardingRouteState>,
    Json(update): Json<FieldUpdate>,
) -> impl IntoResponse {
    state.wizard.handle_change(update).await;
    Json(state.wizard.snapshot().await)
}

/// POST /api/onboarding/photos/{slot}
///
/// Raw image bytes in the body, MIME type in `Content-Type`.
async fn upload_photo(
    State(state): State<OnboardingRouteState>,
    Path(slot): Path<usize>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg");
    let file_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("photo");

    let upload = PhotoUpload::new(file_name, content_type, body.to_vec());
    let outcome = state.wizard.handle_photo_upload(slot, upload).await;
    Json(serde_json::json!({
        "outcome": outcome,
        "wizard": state.wizard.snapshot().await,
    }))
}

/// DELETE /api/onboarding/photos/{slot}
async fn delete_photo(
    State(state): State<OnboardingRouteState>,
    Path(slot): Path<usize>,
) -> impl IntoResponse {
    state.wizard.handle_photo_delete(slot).await;
    Json(state.wizard.snapshot().await)
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    // Photos up to twice the ceiling still reach the wizard's size check.
    let body_limit = state.wizard.max_upload_bytes().saturating_mul(2);
    Router::new()
        .route("/api/onboarding", get(get_wizard))
        .route("/api/onboarding/next", post(next_step))
        .route("/api/onboarding/prev", post(prev_step))
        .route("/api/onboarding/field", post(update_field))
        .route(
            "/api/onboarding/photos/{slot}",
            post(upload_photo)
                .delete(delete_photo)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
