//! Profile, tier sync and account updates

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::tier::{should_update_tier, SubscriptionType, Tier};
use crate::domain::user::{validate_password, validate_username, User, UserId, UserRepository};
use crate::domain::DomainError;
use crate::infrastructure::usage::UsageService;

use super::password::PasswordHasher;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Today's counters as shown on the profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub date: NaiveDate,
    pub basic_requests: u32,
    pub advanced_requests: u32,
    pub total_tokens_used: u64,
    pub daily_limit: u32,
    /// Absent for subscribers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub username: Option<String>,
    pub tier: Tier,
    pub subscription_type: SubscriptionType,
    pub credit_balance: i64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSummary>,
}

impl UserProfile {
    /// Build a profile without usage figures
    pub fn from_user(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            id: user.id(),
            email: user.email().to_string(),
            username: user.username().map(String::from),
            tier: user.computed_tier(now),
            subscription_type: user.subscription_type(now),
            credit_balance: user.credit_balance(),
            created_at: user.created_at(),
            usage: None,
        }
    }
}

#[derive(Debug)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    usage: Arc<UsageService>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Create a new user service
    pub fn new(
        users: Arc<dyn UserRepository>,
        usage: Arc<UsageService>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            usage,
            hasher,
        }
    }

    /// Get a user by ID
    pub async fn get_user(&self, id: &UserId) -> Result<User, DomainError> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    /// Persist the computed tier when the cached one has drifted
    pub async fn sync_tier(&self, user: User) -> Result<User, DomainError> {
        let computed = user.computed_tier(Utc::now());

        if !should_update_tier(user.persisted_tier(), computed) {
            return Ok(user);
        }

        info!(
            user_id = %user.id(),
            from = %user.persisted_tier(),
            to = %computed,
            "Syncing persisted tier"
        );

        let mut user = user;
        user.set_tier(computed);
        self.users.update(&user).await
    }

    /// Profile with today's usage, re-syncing the persisted tier
    pub async fn get_profile(&self, id: &UserId) -> Result<UserProfile, DomainError> {
        let user = self.sync_tier(self.get_user(id).await?).await?;
        let now = Utc::now();
        let mut profile = UserProfile::from_user(&user, now);

        let today = self.usage.get_today_usage(id).await?;
        let daily_limit = self.usage.limits().for_tier(profile.tier).max_requests_per_day;
        let remaining = if user.has_active_subscription(now) {
            None
        } else {
            Some(daily_limit.saturating_sub(today.combined_requests()))
        };

        profile.usage = Some(UsageSummary {
            date: today.date,
            basic_requests: today.basic_requests,
            advanced_requests: today.advanced_requests,
            total_tokens_used: today.total_tokens_used,
            daily_limit,
            remaining,
        });

        Ok(profile)
    }

    /// Update the username and/or password
    pub async fn update_profile(
        &self,
        id: &UserId,
        request: UpdateProfileRequest,
    ) -> Result<UserProfile, DomainError> {
        let mut user = self.get_user(id).await?;

        if let Some(username) = request.username {
            let username = username.trim().to_string();
            validate_username(&username).map_err(|e| DomainError::validation(e.to_string()))?;
            user.set_username(username);
        }

        if let Some(password) = request.password {
            validate_password(&password).map_err(|e| DomainError::validation(e.to_string()))?;
            user.set_password_hash(self.hasher.hash(&password)?);
        }

        let user = self.users.update(&user).await?;
        Ok(UserProfile::from_user(&user, Utc::now()))
    }
}
