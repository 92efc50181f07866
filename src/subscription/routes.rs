//! REST endpoints for the subscription screen and the discovery swipe gate.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::engine::SubscriptionEngine;
use super::model::{SubscriptionPlan, SubscriptionTier};

/// Shared state for subscription routes.
#[derive(Clone)]
pub struct SubscriptionRouteState {
    pub engine: Arc<SubscriptionEngine>,
}

/// Body of `GET /api/subscription`.
#[derive(Debug, Serialize)]
struct StatusResponse {
    tier: SubscriptionTier,
    is_subscribed: bool,
    /// `null` when swipes are unlimited.
    remaining_swipes: Option<u32>,
    can_swipe: bool,
    last_swipe_reset: chrono::DateTime<chrono::Utc>,
    plan: SubscriptionPlan,
}

#[derive(Debug, Deserialize)]
struct TierRequest {
    tier: SubscriptionTier,
}

async fn status_of(engine: &SubscriptionEngine) -> StatusResponse {
    let state = engine.get_state().await;
    StatusResponse {
        tier: state.tier,
        is_subscribed: state.tier.is_paid(),
        remaining_swipes: state.quota(),
        can_swipe: state.can_swipe(),
        last_swipe_reset: state.last_swipe_reset,
        plan: engine.plan(state.tier),
    }
}

/// GET /api/subscription
async fn get_status(State(state): State<SubscriptionRouteState>) -> impl IntoResponse {
    Json(status_of(&state.engine).await)
}

/// GET /api/subscription/plans
async fn get_plans(State(state): State<SubscriptionRouteState>) -> impl IntoResponse {
    Json(state.engine.plans())
}

/// POST /api/subscription/swipe
///
/// Records one like/dislike against the quota.
async fn swipe(State(state): State<SubscriptionRouteState>) -> impl IntoResponse {
    let outcome = state.engine.decrement_swipes().await;
    Json(serde_json::json!({
        "outcome": outcome,
        "status": status_of(&state.engine).await,
    }))
}

/// POST /api/subscription/tier
async fn change_tier(
    State(state): State<SubscriptionRouteState>,
    Json(body): Json<TierRequest>,
) -> impl IntoResponse {
    state.engine.upgrade_tier(body.tier).await;
    Json(status_of(&state.engine).await)
}

/// POST /api/subscription/reset
async fn reset(State(state): State<SubscriptionRouteState>) -> impl IntoResponse {
    state.engine.reset_swipes().await;
    Json(status_of(&state.engine).await)
}

/// Build the subscription REST routes.
pub fn subscription_routes(state: SubscriptionRouteState) -> Router {
    Router::new()
        .route("/api/subscription", get(get_status))
        .route("/api/subscription/plans", get(get_plans))
        .route("/api/subscription/swipe", post(swipe))
        .route("/api/subscription/tier", post(change_tier))
        .route("/api/subscription/reset", post(reset))
        .with_state(state)
}
