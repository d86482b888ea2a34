use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::rate_limit::{GuestRateLimitStore, RateWindow};
use crate::domain::DomainError;

/// Shared fixed windows: INCR, then EXPIRE when the key is new
#[derive(Clone)]
pub struct RedisRateLimitStore {
    connection: ConnectionManager,
}

impl fmt::Debug for RedisRateLimitStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRateLimitStore")
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisRateLimitStore {
    pub async fn connect(url: &str) -> Result<Self, DomainError> {
        let client = Client::open(url)
            .map_err(|e| DomainError::configuration(format!("Invalid Redis URL: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl GuestRateLimitStore for RedisRateLimitStore {
    async fn increment(&self, key: &str, window_secs: u64) -> Result<RateWindow, DomainError> {
        let mut conn = self.connection.clone();
        let window_secs = window_secs.max(1);

        let count: u64 = conn.incr(key, 1u64).await.map_err(|e| {
            DomainError::storage(format!("Failed to increment key '{}': {}", key, e))
        })?;

        let mut ttl: i64 = if count == 1 {
            -1
        } else {
            conn.ttl(key).await.map_err(|e| {
                DomainError::storage(format!("Failed to get TTL for key '{}': {}", key, e))
            })?
        };

        // New key, or one left without an expiry by an interrupted first hit
        if ttl < 0 {
            let _: bool = conn.expire(key, window_secs as i64).await.map_err(|e| {
                DomainError::storage(format!("Failed to set TTL for key '{}': {}", key, e))
            })?;
            ttl = window_secs as i64;
        }

        Ok(RateWindow {
            count,
            expires_in: ttl as u64,
        })
    }
}
