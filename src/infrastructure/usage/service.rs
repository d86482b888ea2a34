//! Usage tracking service

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::domain::calendar::today_local;
use crate::domain::tier::{LimitsTable, Tier};
use crate::domain::usage::{evaluate_usage_limit, UsageCheck, UsageRecord, UsageRepository};
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

pub const DEFAULT_STATS_DAYS: u32 = 7;
pub const MAX_STATS_DAYS: u32 = 90;

#[derive(Debug)]
pub struct UsageService {
    repository: Arc<dyn UsageRepository>,
    limits: LimitsTable,
}

impl UsageService {
    /// Create a new usage service over a limits table
    pub fn new(repository: Arc<dyn UsageRepository>, limits: LimitsTable) -> Self {
        Self { repository, limits }
    }

    pub fn limits(&self) -> &LimitsTable {
        &self.limits
    }

    /// Today's counters, created empty on first read
    pub async fn get_today_usage(&self, user_id: &UserId) -> Result<UsageRecord, DomainError> {
        self.repository.get_or_create(user_id, today_local()).await
    }

    /// Daily limit check for `tier`; an active subscription bypasses the counters
    pub async fn check_usage_limit(
        &self,
        user: &User,
        tier: Tier,
        is_advanced: bool,
    ) -> Result<UsageCheck, DomainError> {
        if user.has_active_subscription(Utc::now()) {
            return Ok(UsageCheck::unlimited());
        }

        let usage = self.get_today_usage(&user.id()).await?;

        Ok(evaluate_usage_limit(
            &usage,
            self.limits.for_tier(tier),
            is_advanced,
            false,
        ))
    }

    /// Count one request and its tokens for today
    pub async fn increment_usage(
        &self,
        user_id: &UserId,
        is_advanced: bool,
        tokens_used: u64,
    ) -> Result<UsageRecord, DomainError> {
        self.repository
            .increment(user_id, today_local(), is_advanced, tokens_used)
            .await
    }

    /// Rows for the last `days` days through today, newest first
    pub async fn get_usage_stats(
        &self,
        user_id: &UserId,
        days: u32,
    ) -> Result<Vec<UsageRecord>, DomainError> {
        let today = today_local();
        let from = today - Duration::days(i64::from(days.min(MAX_STATS_DAYS)));

        self.repository.list_range(user_id, from, today).await
    }
}
