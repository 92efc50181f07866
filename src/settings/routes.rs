//! REST endpoints for app settings.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::theme::{ThemePreference, ThemeSettings};

/// Shared state for settings routes.
#[derive(Clone)]
pub struct SettingsRouteState {
    pub theme: Arc<ThemeSettings>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ThemeBody {
    theme: ThemePreference,
}

/// GET /api/settings/theme
async fn get_theme(State(state): State<SettingsRouteState>) -> impl IntoResponse {
    Json(ThemeBody {
        theme: state.theme.theme().await,
    })
}

/// PUT /api/settings/theme
async fn put_theme(
    State(state): State<SettingsRouteState>,
    Json(body): Json<ThemeBody>,
) -> impl IntoResponse {
    state.theme.set_theme(body.theme).await;
    Json(ThemeBody {
        theme: state.theme.theme().await,
    })
}

pub fn settings_routes(state: SettingsRouteState) -> Router {
    Router::new()
        .route("/api/settings/theme", get(get_theme).put(put_theme))
        .with_state(state)
}
