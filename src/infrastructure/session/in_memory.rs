use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::session::{RefreshSession, SessionRepository};
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, RefreshSession>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: RefreshSession) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&session.jti) {
            return Err(DomainError::conflict("Session already exists"));
        }

        sessions.insert(session.jti.clone(), session);
        Ok(())
    }

    async fn get(&self, jti: &str) -> Result<Option<RefreshSession>, DomainError> {
        Ok(self.sessions.read().await.get(jti).cloned())
    }

    async fn revoke(&self, jti: &str) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(jti) {
            Some(session) if session.revoked_at.is_none() => {
                session.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let mut revoked = 0;

        for session in sessions
            .values_mut()
            .filter(|s| &s.user_id == user_id && s.revoked_at.is_none())
        {
            session.revoked_at = Some(now);
            revoked += 1;
        }

        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_is_one_shot() {
        let repo = InMemorySessionRepository::new();
        let user = UserId::generate();
        repo.create(RefreshSession::new("a", user, Utc::now() + Duration::days(1)))
            .await
            .unwrap();

        assert!(repo.revoke("a").await.unwrap());
        assert!(!repo.revoke("a").await.unwrap());
        assert!(!repo.revoke("missing").await.unwrap());
        assert!(!repo.get("a").await.unwrap().unwrap().is_usable_at(Utc::now()));
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_user() {
        let repo = InMemorySessionRepository::new();
        let user = UserId::generate();
        let other = UserId::generate();
        let expires = Utc::now() + Duration::days(1);

        repo.create(RefreshSession::new("u1", user, expires)).await.unwrap();
        repo.create(RefreshSession::new("u2", user, expires)).await.unwrap();
        repo.create(RefreshSession::new("o1", other, expires)).await.unwrap();
        repo.revoke("u2").await.unwrap();

        assert_eq!(repo.revoke_all(&user).await.unwrap(), 1);
        assert!(repo.get("o1").await.unwrap().unwrap().revoked_at.is_none());
    }
}
