//! Tier calculation and per-tier limits
//!
//! The computed tier is a pure function of a user's credit balance and
//! subscriptions. `guest` is never computed; it is assigned when no
//! authenticated user is present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::billing::{has_active_subscription, Subscription};

/// Credits charged for one advanced generation by a credit-only premium user
pub const CREDIT_COST_PER_ADVANCED: i64 = 1;

const FREE_TIER_ADVANCED_DENIED: &str = "Advanced features are available to Premium users only";
const INSUFFICIENT_CREDIT_ADVANCED: &str =
    "Insufficient credits for advanced features. Please purchase more credits.";

/// Service level of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Guest,
    Free,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "guest" => Some(Self::Guest),
            "free" => Some(Self::Free),
            "premium" => Some(Self::Premium),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a premium tier is funded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionType {
    Subscription,
    Credit,
    None,
}

/// Result of the advanced-feature eligibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvancedAccess {
    pub allowed: bool,
    pub requires_credit: bool,
    pub reason: Option<String>,
}

/// `premium` iff an active subscription exists or the balance is positive
pub fn calculate_tier(
    credit_balance: i64,
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> Tier {
    if has_active_subscription(subscriptions, now) || credit_balance > 0 {
        Tier::Premium
    } else {
        Tier::Free
    }
}

/// Subscription takes priority over credit for labeling
pub fn subscription_type(
    credit_balance: i64,
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> SubscriptionType {
    if has_active_subscription(subscriptions, now) {
        SubscriptionType::Subscription
    } else if credit_balance > 0 {
        SubscriptionType::Credit
    } else {
        SubscriptionType::None
    }
}

pub fn check_advanced_feature_access(
    credit_balance: i64,
    subscriptions: &[Subscription],
    now: DateTime<Utc>,
) -> AdvancedAccess {
    if calculate_tier(credit_balance, subscriptions, now) == Tier::Free {
        return AdvancedAccess {
            allowed: false,
            requires_credit: false,
            reason: Some(FREE_TIER_ADVANCED_DENIED.to_string()),
        };
    }

    if has_active_subscription(subscriptions, now) {
        return AdvancedAccess {
            allowed: true,
            requires_credit: false,
            reason: None,
        };
    }

    if credit_balance < CREDIT_COST_PER_ADVANCED {
        return AdvancedAccess {
            allowed: false,
            requires_credit: true,
            reason: Some(INSUFFICIENT_CREDIT_ADVANCED.to_string()),
        };
    }

    AdvancedAccess {
        allowed: true,
        requires_credit: true,
        reason: None,
    }
}

/// Whether a persisted tier cache has drifted from the computed tier
pub fn should_update_tier(persisted: Tier, computed: Tier) -> bool {
    persisted != computed
}

/// Static limits for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    pub max_requests_per_day: u32,
    pub max_advanced_per_day: u32,
    pub max_input_chars: usize,
    pub max_tokens_per_request: u32,
}

impl TierLimits {
    /// Daily cap applied to advanced requests
    pub fn advanced_limit(&self) -> u32 {
        self.max_advanced_per_day.min(self.max_requests_per_day)
    }
}

/// Limits keyed by tier. Each field left out of a config source keeps
/// that tier's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LimitsOverrides")]
pub struct LimitsTable {
    pub guest: TierLimits,
    pub free: TierLimits,
    pub premium: TierLimits,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TierOverrides {
    max_requests_per_day: Option<u32>,
    max_advanced_per_day: Option<u32>,
    max_input_chars: Option<usize>,
    max_tokens_per_request: Option<u32>,
}

impl TierOverrides {
    fn apply(self, base: TierLimits) -> TierLimits {
        TierLimits {
            max_requests_per_day: self.max_requests_per_day.unwrap_or(base.max_requests_per_day),
            max_advanced_per_day: self.max_advanced_per_day.unwrap_or(base.max_advanced_per_day),
            max_input_chars: self.max_input_chars.unwrap_or(base.max_input_chars),
            max_tokens_per_request: self
                .max_tokens_per_request
                .unwrap_or(base.max_tokens_per_request),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LimitsOverrides {
    guest: TierOverrides,
    free: TierOverrides,
    premium: TierOverrides,
}

impl From<LimitsOverrides> for LimitsTable {
    fn from(overrides: LimitsOverrides) -> Self {
        Self {
            guest: overrides.guest.apply(default_guest_limits()),
            free: overrides.free.apply(default_free_limits()),
            premium: overrides.premium.apply(default_premium_limits()),
        }
    }
}

impl LimitsTable {
    pub fn for_tier(&self, tier: Tier) -> &TierLimits {
        match tier {
            Tier::Guest => &self.guest,
            Tier::Free => &self.free,
            Tier::Premium => &self.premium,
        }
    }
}

impl Default for LimitsTable {
    fn default() -> Self {
        Self {
            guest: default_guest_limits(),
            free: default_free_limits(),
            premium: default_premium_limits(),
        }
    }
}

fn default_guest_limits() -> TierLimits {
    TierLimits {
        max_requests_per_day: 3,
        max_advanced_per_day: 3,
        max_input_chars: 150,
        max_tokens_per_request: 100,
    }
}

fn default_free_limits() -> TierLimits {
    TierLimits {
        max_requests_per_day: 10,
        max_advanced_per_day: 5,
        max_input_chars: 300,
        max_tokens_per_request: 200,
    }
}

fn default_premium_limits() -> TierLimits {
    TierLimits {
        max_requests_per_day: 100,
        max_advanced_per_day: 100,
        max_input_chars: 600,
        max_tokens_per_request: 400,
    }
}
