//! SubscriptionEngine — owns the tier, the free-tier swipe counter and the
//! weekly refill, writing every change through to the key-value store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::TimeSource;
use crate::notify::{Notification, NotificationSink};
use crate::store::KeyValueStore;

use super::model::{
    SubscriptionPlan, SubscriptionState, SubscriptionTier, maybe_reset, settings_keys,
};

/// Result of recording one swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum SwipeOutcome {
    /// Paid tier, nothing counted.
    Unlimited,
    /// One swipe consumed; `remaining` left until the next refill.
    Counted { remaining: u32 },
    /// The counter was already at zero; nothing changed.
    LimitReached,
}

/// Subscription state service. Construct once per session and share by `Arc`.
pub struct SubscriptionEngine {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn TimeSource>,
    notifier: Arc<dyn NotificationSink>,
    state: RwLock<SubscriptionState>,
}

impl SubscriptionEngine {
    /// Rehydrate from the store, falling back to defaults for any key that is
    /// absent or unparseable, then run the refill check once.
    pub async fn load(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn TimeSource>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let state = load_state(store.as_ref(), clock.now()).await;
        info!(
            tier = %state.tier,
            remaining_swipes = state.remaining_swipes,
            last_swipe_reset = %state.last_swipe_reset,
            "Subscription state loaded"
        );

        let engine = Self {
            store,
            clock,
            notifier,
            state: RwLock::new(state),
        };
        {
            let state = engine.state.read().await;
            engine.persist(&state).await;
        }
        engine.check_weekly_reset().await;
        engine
    }

    /// Current state, after applying a due refill.
    pub async fn get_state(&self) -> SubscriptionState {
        self.check_weekly_reset().await;
        self.state.read().await.clone()
    }

    pub async fn current_tier(&self) -> SubscriptionTier {
        self.get_state().await.tier
    }

    /// Whether the discovery screen may accept another like/dislike.
    pub async fn can_swipe(&self) -> bool {
        self.get_state().await.can_swipe()
    }

    pub fn plans(&self) -> Vec<SubscriptionPlan> {
        SubscriptionPlan::catalog()
    }

    pub fn plan(&self, tier: SubscriptionTier) -> SubscriptionPlan {
        SubscriptionPlan::for_tier(tier)
    }

    /// Count one swipe against the free quota.
    ///
    /// Warns once three or fewer swipes are left and reports the limit when
    /// the counter hits zero. The counter never goes below zero.
    pub async fn decrement_swipes(&self) -> SwipeOutcome {
        self.check_weekly_reset().await;

        let mut state = self.state.write().await;
        if state.tier.is_paid() {
            return SwipeOutcome::Unlimited;
        }

        if state.remaining_swipes == 0 {
            debug!("Swipe attempted with an empty quota");
            self.notifier.notify(limit_reached());
            return SwipeOutcome::LimitReached;
        }

        state.remaining_swipes -= 1;
        let remaining = state.remaining_swipes;
        self.persist(&state).await;
        drop(state);

        debug!(remaining, "Swipe counted");
        match remaining {
            0 => self.notifier.notify(limit_reached()),
            1..=3 => self.notifier.notify(
                Notification::warning(swipes_remaining_title(remaining))
                    .with_message("Consider upgrading to Premium for unlimited swipes!"),
            ),
            _ => {}
        }

        SwipeOutcome::Counted { remaining }
    }

    /// Refill the free quota now. No-op for paid tiers.
    pub async fn reset_swipes(&self) {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        if state.tier.is_paid() {
            debug!(tier = %state.tier, "Ignoring swipe reset for paid tier");
            return;
        }
        state.reset(now);
        self.persist(&state).await;
        info!("Swipes reset");
    }

    /// Switch plans. The counter is left alone: a downgrade resumes from
    /// whatever value it held, subject to the next scheduled refill.
    pub async fn upgrade_tier(&self, tier: SubscriptionTier) {
        let mut state = self.state.write().await;
        let previous = state.tier;
        state.tier = tier;
        self.persist(&state).await;
        drop(state);

        info!(from = %previous, to = %tier, "Subscription tier changed");

        if tier.is_paid() {
            let plan = SubscriptionPlan::for_tier(tier);
            self.notifier.notify(
                Notification::success("Subscription Activated!").with_message(format!(
                    "You're now on the {} plan. Enjoy your benefits!",
                    plan.name
                )),
            );
        }
    }

    /// Apply the weekly refill if it is due. Returns whether a refill happened.
    pub async fn check_weekly_reset(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let refreshed = maybe_reset(&state, now);
        if refreshed == *state {
            return false;
        }

        *state = refreshed;
        self.persist(&state).await;
        drop(state);

        info!("Weekly swipe quota refilled");
        self.notifier.notify(
            Notification::success("Swipes Refreshed!")
                .with_message("Your free swipes have been reset for the week."),
        );
        true
    }

    /// Write all three keys, one at a time. A failed write is logged and
    /// otherwise ignored; the in-memory state stays authoritative.
    async fn persist(&self, state: &SubscriptionState) {
        let writes = [
            (settings_keys::TIER, state.tier.to_string()),
            (
                settings_keys::REMAINING_SWIPES,
                state.remaining_swipes.to_string(),
            ),
            (
                settings_keys::LAST_SWIPE_RESET,
                state.last_swipe_reset.to_rfc3339(),
            ),
        ];
        for (key, value) in writes {
            if let Err(e) = self.store.set(key, &value).await {
                warn!(key, "Failed to persist subscription state: {}", e);
            }
        }
    }
}

fn limit_reached() -> Notification {
    Notification::error("Swipe limit reached").with_message(
        "You've used all your free swipes for this week. Upgrade to Premium for unlimited swipes!",
    )
}

fn swipes_remaining_title(remaining: u32) -> String {
    if remaining == 1 {
        "1 swipe remaining".to_string()
    } else {
        format!("{remaining} swipes remaining")
    }
}

/// Read the persisted state key by key. Missing or malformed values fall back
/// to their defaults without surfacing anything to the user.
async fn load_state(store: &dyn KeyValueStore, now: DateTime<Utc>) -> SubscriptionState {
    let defaults = SubscriptionState::new(now);

    let tier = read_key(store, settings_keys::TIER)
        .await
        .and_then(|raw| match raw.parse::<SubscriptionTier>() {
            Ok(tier) => Some(tier),
            Err(e) => {
                debug!("Ignoring persisted tier: {}", e);
                None
            }
        })
        .unwrap_or(defaults.tier);

    let remaining_swipes = read_key(store, settings_keys::REMAINING_SWIPES)
        .await
        .and_then(|raw| match raw.trim().parse::<u32>() {
            Ok(n) => Some(n),
            Err(e) => {
                debug!(raw = %raw, "Ignoring persisted swipe counter: {}", e);
                None
            }
        })
        .unwrap_or(defaults.remaining_swipes);

    let last_swipe_reset = read_key(store, settings_keys::LAST_SWIPE_RESET)
        .await
        .and_then(|raw| match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                debug!(raw = %raw, "Ignoring persisted reset timestamp: {}", e);
                None
            }
        })
        .unwrap_or(defaults.last_swipe_reset);

    SubscriptionState {
        tier,
        remaining_swipes,
        last_swipe_reset,
    }
}

async fn read_key(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(key, "Failed to read persisted setting: {}", e);
            None
        }
    }
}

/// Spawn the periodic refill check. Abort the handle on teardown.
pub fn spawn_reset_ticker(
    engine: Arc<SubscriptionEngine>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip immediate first tick; load() already checked
        ticker.tick().await;

        loop {
            ticker.tick().await;
            engine.check_weekly_reset().await;
        }
    })
}
