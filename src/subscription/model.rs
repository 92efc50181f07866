//! Subscription data model: tiers, the static plan catalog, and the persisted
//! quota state together with its weekly refill rule.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Swipes a free user gets per refill.
pub const FREE_SWIPE_LIMIT: u32 = 10;

/// Days between free-tier refills.
pub const RESET_PERIOD_DAYS: i64 = 7;

/// The plan a user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Weekly,
    Monthly,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [Self::Free, Self::Weekly, Self::Monthly];

    /// Paid tiers have no swipe quota.
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subscription tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for SubscriptionTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(UnknownTier(other.to_string())),
        }
    }
}

/// Catalog entry describing one tier. Reference data, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionPlan {
    pub tier: SubscriptionTier,
    pub name: &'static str,
    pub price: Decimal,
    /// Billing interval; `None` for the free plan.
    pub interval: Option<&'static str>,
    pub features: &'static [&'static str],
    /// Swipes per refill. `None` = unlimited.
    pub swipe_limit: Option<u32>,
}

impl SubscriptionPlan {
    /// Get the plan for a specific tier.
    ///
    /// | Tier | Price | Interval | Swipes |
    /// |------|-------|----------|--------|
    /// | Free | $0 | - | 10 |
    /// | Weekly | $4.99 | week | Unlimited |
    /// | Monthly | $14.99 | month | Unlimited |
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => Self {
                tier,
                name: "Free",
                price: Decimal::ZERO,
                interval: None,
                features: &["10 swipes per week", "Basic matching", "Limited messaging"],
                swipe_limit: Some(FREE_SWIPE_LIMIT),
            },
            SubscriptionTier::Weekly => Self {
                tier,
                name: "Premium Weekly",
                price: dec!(4.99),
                interval: Some("week"),
                features: &[
                    "Unlimited swipes",
                    "Priority matching",
                    "See who likes you",
                    "Advanced filters",
                    "Unlimited messaging",
                ],
                swipe_limit: None,
            },
            SubscriptionTier::Monthly => Self {
                tier,
                name: "Premium Monthly",
                price: dec!(14.99),
                interval: Some("month"),
                features: &[
                    "Unlimited swipes",
                    "Priority matching",
                    "See who likes you",
                    "Advanced filters",
                    "Unlimited messaging",
                    "Profile boosts",
                    "Discounted rate",
                ],
                swipe_limit: None,
            },
        }
    }

    /// Every plan, in display order.
    pub fn catalog() -> Vec<Self> {
        SubscriptionTier::ALL.into_iter().map(Self::for_tier).collect()
    }

    /// Price as shown on the plan card, e.g. `$4.99/week` or `$0`.
    pub fn display_price(&self) -> String {
        match self.interval {
            Some(interval) => format!("${}/{}", self.price, interval),
            None => format!("${}", self.price),
        }
    }
}

/// The persisted subscription aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionState {
    pub tier: SubscriptionTier,
    /// Free-tier counter. Ignored while the tier is paid.
    pub remaining_swipes: u32,
    /// When the free quota was last refilled.
    pub last_swipe_reset: DateTime<Utc>,
}

impl SubscriptionState {
    /// Fresh-install defaults: free tier, full quota, refilled now.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            tier: SubscriptionTier::Free,
            remaining_swipes: FREE_SWIPE_LIMIT,
            last_swipe_reset: now,
        }
    }

    /// The enforced quota, or `None` when swipes are unlimited.
    pub fn quota(&self) -> Option<u32> {
        if self.tier.is_paid() {
            None
        } else {
            Some(self.remaining_swipes)
        }
    }

    /// Whether another swipe is allowed right now.
    pub fn can_swipe(&self) -> bool {
        self.quota().is_none_or(|remaining| remaining > 0)
    }

    /// Whether the weekly refill applies at `now`.
    ///
    /// A clock that moved backwards yields a negative elapsed time and never
    /// triggers a refill.
    pub fn is_reset_due(&self, now: DateTime<Utc>) -> bool {
        !self.tier.is_paid() && now - self.last_swipe_reset >= Duration::days(RESET_PERIOD_DAYS)
    }

    /// Refill the free quota. No-op for paid tiers.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        if !self.tier.is_paid() {
            self.remaining_swipes = FREE_SWIPE_LIMIT;
            self.last_swipe_reset = now;
        }
    }
}

/// Apply the weekly refill rule: returns the state as it should be at `now`.
pub fn maybe_reset(state: &SubscriptionState, now: DateTime<Utc>) -> SubscriptionState {
    let mut next = state.clone();
    if state.is_reset_due(now) {
        next.reset(now);
    }
    next
}

/// Keys used for subscription persistence.
pub mod settings_keys {
    pub const TIER: &str = "subscription_tier";
    pub const REMAINING_SWIPES: &str = "remaining_swipes";
    pub const LAST_SWIPE_RESET: &str = "last_swipe_reset";
}
