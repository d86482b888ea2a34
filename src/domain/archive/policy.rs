use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::domain::calendar::start_of_local_day;
use crate::domain::tier::Tier;

/// Hybrid retention: archives older than `retention_days` go, and beyond that
/// only the newest `max_count` are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub retention_days: i64,
    pub max_count: u64,
}

impl RetentionPolicy {
    pub const FREE: Self = Self {
        retention_days: 7,
        max_count: 200,
    };

    pub const PREMIUM: Self = Self {
        retention_days: 30,
        max_count: 2000,
    };

    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Premium => Self::PREMIUM,
            Tier::Free | Tier::Guest => Self::FREE,
        }
    }

    /// Local midnight of `today` minus the retention window
    pub fn cutoff(&self, today: NaiveDate) -> DateTime<Utc> {
        start_of_local_day(today - Duration::days(self.retention_days))
    }

    /// Rows to drop by count once `count` rows remain
    pub fn excess(&self, count: u64) -> u64 {
        count.saturating_sub(self.max_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::today_local;

    #[test]
    fn test_policy_per_tier() {
        assert_eq!(RetentionPolicy::for_tier(Tier::Free).retention_days, 7);
        assert_eq!(RetentionPolicy::for_tier(Tier::Free).max_count, 200);
        assert_eq!(RetentionPolicy::for_tier(Tier::Premium).retention_days, 30);
        assert_eq!(RetentionPolicy::for_tier(Tier::Premium).max_count, 2000);
    }

    #[test]
    fn test_excess_boundary() {
        let policy = RetentionPolicy::FREE;
        assert_eq!(policy.excess(199), 0);
        assert_eq!(policy.excess(200), 0);
        assert_eq!(policy.excess(203), 3);
    }

    #[test]
    fn test_cutoff_is_a_local_midnight_in_the_past() {
        let today = today_local();
        let cutoff = RetentionPolicy::FREE.cutoff(today);
        let now = Utc::now();

        assert!(cutoff < now - Duration::days(6));
        assert!(cutoff > now - Duration::days(9));
    }
}
