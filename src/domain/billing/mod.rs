//! Billing state owned by the billing collaborator: subscriptions and the credit ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

/// Lifecycle status of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }

    /// Parse a stored status
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "cancelled" => Some(Self::Cancelled),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// A paid subscription window. Read-only to this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(
        user_id: UserId,
        status: SubscriptionStatus,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            status,
            start_at,
            end_at,
        }
    }

    /// Active status and `start_at <= now < end_at`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.start_at <= now && now < self.end_at
    }
}

/// Whether any subscription in the list is active at `now`
pub fn has_active_subscription(subscriptions: &[Subscription], now: DateTime<Utc>) -> bool {
    subscriptions.iter().any(|s| s.is_active_at(now))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

/// Append-only credit ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: UserId,
    /// Negative for charges
    pub amount: i64,
    pub status: TransactionStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Ledger entry for a completed charge of `cost` credits
    pub fn charge(user_id: UserId, cost: i64, reason: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount: -cost,
            status: TransactionStatus::Completed,
            reason: reason.into(),
            created_at: Utc::now(),
        }
    }
}

/// Ledger reasons used by credit-gated actions
pub mod reasons {
    pub const ADVANCED_GENERATION: &str = "advanced email generation";
    pub const TEMPLATE_SAVE: &str = "template save";
}
