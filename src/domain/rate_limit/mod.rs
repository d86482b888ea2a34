//! Fixed-window counters for anonymous callers

use async_trait::async_trait;
use std::fmt::Debug;

use super::DomainError;

pub const GUEST_LIMIT_MESSAGE: &str =
    "Guest usage limit reached. Please sign up to continue generating emails.";

/// Counter state after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u64,
    /// Seconds until the window resets
    pub expires_in: u64,
}

const GUEST_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Window length and maximum hits per key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: u64,
    pub window_secs: u64,
}

impl RateLimitRule {
    /// `max_requests` per key over a 24 hour window
    pub fn guest_daily(max_requests: u32) -> Self {
        Self {
            max_requests: u64::from(max_requests),
            window_secs: GUEST_WINDOW_SECS,
        }
    }

    pub fn allows(&self, window: &RateWindow) -> bool {
        window.count <= self.max_requests
    }
}

/// Counting store keyed by caller identity. Every call counts, including
/// calls that end up rejected.
#[async_trait]
pub trait GuestRateLimitStore: Send + Sync + Debug {
    async fn increment(&self, key: &str, window_secs: u64) -> Result<RateWindow, DomainError>;
}

pub fn guest_key(ip: &str) -> String {
    format!("guest:ratelimit:{}", ip)
}
