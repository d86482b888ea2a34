use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::rate_limit::{GuestRateLimitStore, RateWindow};
use crate::domain::DomainError;

#[derive(Debug, Clone, Copy)]
struct Counter {
    count: u64,
    resets_at: Instant,
}

/// Process-local fixed windows. Only correct for a single instance.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    counters: RwLock<HashMap<String, Counter>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn increment_at(&self, key: &str, window_secs: u64, now: Instant) -> RateWindow {
        let mut counters = self.counters.write().await;

        // Expired windows are dropped lazily
        counters.retain(|_, c| c.resets_at > now);

        let counter = counters.entry(key.to_string()).or_insert(Counter {
            count: 0,
            resets_at: now + Duration::from_secs(window_secs),
        });
        counter.count += 1;

        RateWindow {
            count: counter.count,
            expires_in: counter.resets_at.saturating_duration_since(now).as_secs(),
        }
    }
}

#[async_trait]
impl GuestRateLimitStore for InMemoryRateLimitStore {
    async fn increment(&self, key: &str, window_secs: u64) -> Result<RateWindow, DomainError> {
        Ok(self.increment_at(key, window_secs, Instant::now()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_within_window() {
        let store = InMemoryRateLimitStore::new();

        for expected in 1..=4 {
            let window = store.increment("guest:ratelimit:1.2.3.4", 60).await.unwrap();
            assert_eq!(window.count, expected);
            assert!(window.expires_in <= 60);
        }

        let other = store.increment("guest:ratelimit:5.6.7.8", 60).await.unwrap();
        assert_eq!(other.count, 1);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let store = InMemoryRateLimitStore::new();
        let start = Instant::now();

        store.increment_at("k", 10, start).await;
        store.increment_at("k", 10, start).await;

        let later = store.increment_at("k", 10, start + Duration::from_secs(11)).await;
        assert_eq!(later.count, 1);
        assert_eq!(later.expires_in, 10);
    }
}
