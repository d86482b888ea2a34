//! Refresh-token sessions
//!
//! Each issued refresh token is recorded by its `jti`. Refreshing revokes the
//! presented session and opens a new one; a revoked or expired session can
//! never be used again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

use super::user::UserId;
use super::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub jti: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn new(jti: impl Into<String>, user_id: UserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            jti: jti.into(),
            user_id,
            expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[async_trait]
pub trait SessionRepository: Send + Sync + Debug {
    async fn create(&self, session: RefreshSession) -> Result<(), DomainError>;

    async fn get(&self, jti: &str) -> Result<Option<RefreshSession>, DomainError>;

    /// Mark one session revoked; returns false if it was missing or already revoked
    async fn revoke(&self, jti: &str) -> Result<bool, DomainError>;

    /// Revoke every live session of a user, returning how many were revoked
    async fn revoke_all(&self, user_id: &UserId) -> Result<u64, DomainError>;
}
