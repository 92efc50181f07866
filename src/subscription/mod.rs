//! Subscription tiers and the free-tier swipe quota.
//!
//! Free users get a fixed number of swipes that refills once a week. Paid
//! tiers are unlimited. State is persisted to the local key-value store so it
//! survives restarts.

pub mod engine;
pub mod model;
pub mod routes;

pub use engine::{SubscriptionEngine, SwipeOutcome, spawn_reset_ticker};
pub use model::{
    FREE_SWIPE_LIMIT, RESET_PERIOD_DAYS, SubscriptionPlan, SubscriptionState, SubscriptionTier,
    maybe_reset,
};
pub use routes::{SubscriptionRouteState, subscription_routes};
