//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::billing::{has_active_subscription, Subscription};
use crate::domain::tier::{calculate_tier, subscription_type, SubscriptionType, Tier};

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an existing UUID
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the textual form used in tokens and paths
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registered user with billing state
#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    email: String,
    username: Option<String>,
    password_hash: String,
    credit_balance: i64,
    /// Cached tier; may lag the computed tier
    tier: Tier,
    subscriptions: Vec<Subscription>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with no credit and no subscriptions
    pub fn new(
        email: impl Into<String>,
        username: Option<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: UserId::generate(),
            email: email.into(),
            username,
            password_hash: password_hash.into(),
            credit_balance: 0,
            tier: Tier::Free,
            subscriptions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from storage
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: UserId,
        email: String,
        username: Option<String>,
        password_hash: String,
        credit_balance: i64,
        tier: Tier,
        subscriptions: Vec<Subscription>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            username,
            password_hash,
            credit_balance,
            tier,
            subscriptions,
            created_at,
            updated_at,
        }
    }

    /// Set the starting credit balance
    pub fn with_credit_balance(mut self, credit_balance: i64) -> Self {
        self.credit_balance = credit_balance;
        self
    }

    /// Attach a subscription record
    pub fn with_subscription(mut self, subscription: Subscription) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    // Getters

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Argon2 hash, never serialized
    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn credit_balance(&self) -> i64 {
        self.credit_balance
    }

    /// Tier as last stored, which may lag the computed one
    pub fn persisted_tier(&self) -> Tier {
        self.tier
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Billing state

    /// Tier derived from subscriptions and credit at `now`
    pub fn computed_tier(&self, now: DateTime<Utc>) -> Tier {
        calculate_tier(self.credit_balance, &self.subscriptions, now)
    }

    /// Check for a subscription covering `now`
    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        has_active_subscription(&self.subscriptions, now)
    }

    /// How the user reaches premium, if at all
    pub fn subscription_type(&self, now: DateTime<Utc>) -> SubscriptionType {
        subscription_type(self.credit_balance, &self.subscriptions, now)
    }

    // Mutators

    /// Update the username
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
        self.touch();
    }

    /// Update the password hash
    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.touch();
    }

    /// Update the persisted tier
    pub fn set_tier(&mut self, tier: Tier) {
        self.tier = tier;
        self.touch();
    }

    pub(crate) fn set_credit_balance(&mut self, credit_balance: i64) {
        self.credit_balance = credit_balance;
        self.touch();
    }

    pub(crate) fn set_subscriptions(&mut self, subscriptions: Vec<Subscription>) {
        self.subscriptions = subscriptions;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionStatus;
    use chrono::Duration;

    #[test]
    fn test_new_user_is_free() {
        let user = User::new("a@example.com", None, "hash");

        assert_eq!(user.credit_balance(), 0);
        assert_eq!(user.persisted_tier(), Tier::Free);
        assert_eq!(user.computed_tier(Utc::now()), Tier::Free);
        assert_eq!(user.subscription_type(Utc::now()), SubscriptionType::None);
    }

    #[test]
    fn test_credit_makes_premium() {
        let user = User::new("a@example.com", None, "hash").with_credit_balance(2);
        assert_eq!(user.computed_tier(Utc::now()), Tier::Premium);
        assert_eq!(user.subscription_type(Utc::now()), SubscriptionType::Credit);
    }

    #[test]
    fn test_subscription_makes_premium() {
        let now = Utc::now();
        let user = User::new("a@example.com", None, "hash");
        let sub = Subscription::new(
            user.id(),
            SubscriptionStatus::Active,
            now - Duration::days(1),
            now + Duration::days(29),
        );
        let user = user.with_subscription(sub);

        assert!(user.has_active_subscription(now));
        assert_eq!(user.computed_tier(now), Tier::Premium);
    }

    #[test]
    fn test_user_id_parse() {
        let id = UserId::generate();
        assert_eq!(UserId::parse(&id.to_string()), Some(id));
        assert_eq!(UserId::parse("not-a-uuid"), None);
    }

    #[test]
    fn test_set_tier_touches() {
        let mut user = User::new("a@example.com", None, "hash");
        let before = user.updated_at();
        user.set_tier(Tier::Premium);

        assert_eq!(user.persisted_tier(), Tier::Premium);
        assert!(user.updated_at() >= before);
    }
}
