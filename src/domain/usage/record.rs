//! Per-user, per-day usage counters and the daily limit check

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::tier::TierLimits;
use crate::domain::user::UserId;

/// Counters for one `(user, date)` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub basic_requests: u32,
    pub advanced_requests: u32,
    pub total_tokens_used: u64,
}

impl UsageRecord {
    /// Zeroed counters for one day
    pub fn empty(user_id: UserId, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            basic_requests: 0,
            advanced_requests: 0,
            total_tokens_used: 0,
        }
    }

    /// Apply one request to the counters
    pub fn record(&mut self, is_advanced: bool, tokens_used: u64) {
        if is_advanced {
            self.advanced_requests += 1;
        } else {
            self.basic_requests += 1;
        }
        self.total_tokens_used += tokens_used;
    }

    /// Basic and advanced requests together
    pub fn combined_requests(&self) -> u32 {
        self.basic_requests + self.advanced_requests
    }
}

/// Outcome of a daily limit check. `remaining` is absent for subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

impl UsageCheck {
    /// Allowed with no remaining count, for subscribers
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            reason: None,
            remaining: None,
        }
    }
}

/// Evaluate today's counters against a tier's limits.
///
/// Advanced requests are capped by the advanced limit alone. Basic requests are
/// capped by the combined count, so advanced usage also consumes basic quota.
pub fn evaluate_usage_limit(
    usage: &UsageRecord,
    limits: &TierLimits,
    is_advanced: bool,
    has_active_subscription: bool,
) -> UsageCheck {
    if has_active_subscription {
        return UsageCheck::unlimited();
    }

    let (current, limit, label) = if is_advanced {
        (
            usage.advanced_requests,
            limits.advanced_limit(),
            "advanced feature",
        )
    } else {
        (usage.combined_requests(), limits.max_requests_per_day, "request")
    };

    if current >= limit {
        return UsageCheck {
            allowed: false,
            reason: Some(format!(
                "Daily {} limit reached ({} per day). Please try again tomorrow.",
                label, limit
            )),
            remaining: Some(0),
        };
    }

    UsageCheck {
        allowed: true,
        reason: None,
        remaining: Some(limit - current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::today_local;
    use crate::domain::tier::{LimitsTable, Tier};

    fn usage(basic: u32, advanced: u32) -> UsageRecord {
        UsageRecord {
            user_id: UserId::generate(),
            date: today_local(),
            basic_requests: basic,
            advanced_requests: advanced,
            total_tokens_used: 0,
        }
    }

    #[test]
    fn test_basic_within_limit() {
        let table = LimitsTable::default();
        let check = evaluate_usage_limit(&usage(9, 0), table.for_tier(Tier::Free), false, false);

        assert!(check.allowed);
        assert_eq!(check.remaining, Some(1));
    }

    #[test]
    fn test_basic_at_limit_denied_with_number() {
        let table = LimitsTable::default();
        let check = evaluate_usage_limit(&usage(10, 0), table.for_tier(Tier::Free), false, false);

        assert!(!check.allowed);
        assert_eq!(check.remaining, Some(0));
        assert!(check.reason.unwrap().contains("(10 per day)"));
    }

    #[test]
    fn test_advanced_consumes_basic_quota() {
        let table = LimitsTable::default();
        let limits = table.for_tier(Tier::Free);

        let basic = evaluate_usage_limit(&usage(5, 5), limits, false, false);
        assert!(!basic.allowed);

        let advanced = evaluate_usage_limit(&usage(9, 0), limits, true, false);
        assert!(advanced.allowed);
        assert_eq!(advanced.remaining, Some(5));
    }

    #[test]
    fn test_advanced_limit() {
        let table = LimitsTable::default();
        let check = evaluate_usage_limit(&usage(0, 5), table.for_tier(Tier::Free), true, false);

        assert!(!check.allowed);
        assert!(check.reason.unwrap().contains("(5 per day)"));
    }

    #[test]
    fn test_subscription_bypasses_counters() {
        let table = LimitsTable::default();
        let check =
            evaluate_usage_limit(&usage(500, 500), table.for_tier(Tier::Premium), true, true);

        assert!(check.allowed);
        assert_eq!(check.remaining, None);
    }

    #[test]
    fn test_never_negative_remaining() {
        let table = LimitsTable::default();

        for tier in [Tier::Guest, Tier::Free, Tier::Premium] {
            for basic in 0..120 {
                for advanced in [0, 3, 50, 150] {
                    for is_advanced in [false, true] {
                        let check = evaluate_usage_limit(
                            &usage(basic, advanced),
                            table.for_tier(tier),
                            is_advanced,
                            false,
                        );
                        if check.allowed {
                            assert!(check.remaining.unwrap_or(0) > 0);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_record_increments_one_counter() {
        let mut record = UsageRecord::empty(UserId::generate(), today_local());
        record.record(true, 120);
        record.record(false, 30);

        assert_eq!(record.advanced_requests, 1);
        assert_eq!(record.basic_requests, 1);
        assert_eq!(record.total_tokens_used, 150);
    }
}
