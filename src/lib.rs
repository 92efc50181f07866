//! loveSpark: subscription gating and profile onboarding for a dating app.

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod notify;
pub mod onboarding;
pub mod settings;
pub mod store;
pub mod subscription;

use std::sync::Arc;

use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use tracing::{info, warn};

use backend::{
    AuthProvider, DemoImageStore, ImageStore, MemoryProfileStore, ProfileStore, RestBackend,
    StaticAuth,
};
use clock::{SystemClock, TimeSource};
use config::AppConfig;
use notify::{BroadcastNotifier, NotificationSink, notification_routes};
use onboarding::{OnboardingRouteState, OnboardingWizard, onboarding_routes};
use settings::{SettingsRouteState, ThemeSettings, settings_routes};
use store::{KeyValueStore, LibSqlStore};
use subscription::{SubscriptionEngine, SubscriptionRouteState, subscription_routes};

/// The long-lived services behind the HTTP surface.
#[derive(Clone)]
pub struct AppServices {
    pub subscription: Arc<SubscriptionEngine>,
    pub wizard: Arc<OnboardingWizard>,
    pub theme: Arc<ThemeSettings>,
    /// Every notification raised by the services, fanned out to feed clients.
    pub notifications: Arc<BroadcastNotifier>,
}

impl AppServices {
    /// Open the local store and wire every service from `config`.
    ///
    /// With a backend configured, auth, profiles and photos go through
    /// [`RestBackend`]; otherwise the in-process demo stand-ins are used.
    pub async fn build(config: &AppConfig) -> error::Result<Self> {
        let notifications = Arc::new(BroadcastNotifier::new());
        let notifier: Arc<dyn NotificationSink> = notifications.clone();
        let store: Arc<dyn KeyValueStore> = Arc::new(LibSqlStore::new_local(&config.db_path).await?);
        info!(path = %config.db_path.display(), "Settings store opened");
        let clock: Arc<dyn TimeSource> = Arc::new(SystemClock);

        let auth: Arc<dyn AuthProvider>;
        let profiles: Arc<dyn ProfileStore>;
        let images: Arc<dyn ImageStore>;
        match &config.backend {
            Some(backend) => {
                info!(url = %backend.url, bucket = %backend.bucket, "Using remote backend");
                let rest = Arc::new(
                    RestBackend::new(backend)
                        .with_max_upload_bytes(config.onboarding.max_upload_bytes),
                );
                auth = rest.clone();
                profiles = rest.clone();
                images = rest;
            }
            None => {
                auth = match &config.user_id {
                    Some(id) => Arc::new(StaticAuth::signed_in(id.clone())),
                    None => {
                        warn!("No backend and no LOVESPARK_USER_ID, onboarding runs signed out");
                        Arc::new(StaticAuth::signed_out())
                    }
                };
                info!("No backend configured, using demo photo and profile stores");
                profiles = Arc::new(MemoryProfileStore::new());
                images = Arc::new(DemoImageStore::new());
            }
        }

        let subscription =
            Arc::new(SubscriptionEngine::load(Arc::clone(&store), clock, Arc::clone(&notifier)).await);
        let wizard = Arc::new(OnboardingWizard::new(
            auth,
            profiles,
            images,
            notifier,
            config.onboarding.clone(),
        ));
        let theme = Arc::new(ThemeSettings::load(store).await);

        Ok(Self {
            subscription,
            wizard,
            theme,
            notifications,
        })
    }
}

/// Build the full router: health check plus every REST route.
pub fn app_router(services: &AppServices) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(subscription_routes(SubscriptionRouteState {
            engine: Arc::clone(&services.subscription),
        }))
        .merge(onboarding_routes(OnboardingRouteState {
            wizard: Arc::clone(&services.wizard),
        }))
        .merge(settings_routes(SettingsRouteState {
            theme: Arc::clone(&services.theme),
        }))
        .merge(notification_routes(Arc::clone(&services.notifications)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any),
        )
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lovespark"
    }))
}
