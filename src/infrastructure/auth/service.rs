use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::session::SessionRepository;
use crate::domain::user::{
    normalize_email, validate_email, validate_password, validate_username, User, UserId,
    UserRepository,
};
use crate::domain::DomainError;
use crate::infrastructure::user::{PasswordHasher, UserProfile};

use super::jwt::{JwtService, TokenType};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_REFRESH: &str = "Invalid or expired refresh token";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_max_age_secs: u64,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub tokens: TokenPair,
    pub user: UserProfile,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, DomainError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(format!("{} is required", field)))
}

#[derive(Debug)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    hasher: Arc<dyn PasswordHasher>,
    jwt: Arc<JwtService>,
}

impl AuthService {
    /// Create a new auth service
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        hasher: Arc<dyn PasswordHasher>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
            jwt,
        }
    }

    /// Token signer shared with the request extractors
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Register a user with a hashed password
    pub async fn signup(&self, request: SignupRequest) -> Result<UserProfile, DomainError> {
        let email = normalize_email(required("email", &request.email)?);
        validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;

        let password = required("password", &request.password)?;
        validate_password(password).map_err(|e| DomainError::validation(e.to_string()))?;

        let username = match request.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                validate_username(name).map_err(|e| DomainError::validation(e.to_string()))?;
                Some(name.to_string())
            }
            _ => None,
        };

        if self.users.email_exists(&email).await? {
            return Err(DomainError::conflict("Email already in use"));
        }

        let user = User::new(email, username, self.hasher.hash(password)?);
        let user = self.users.create(user).await?;

        info!(user_id = %user.id(), "User signed up");
        Ok(UserProfile::from_user(&user, Utc::now()))
    }

    /// Authenticate by email and password and open a refresh session
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResult, DomainError> {
        let email = normalize_email(required("email", &request.email)?);
        let password = required("password", &request.password)?;

        let user = match self.users.get_by_email(&email).await? {
            Some(user) if self.hasher.verify(password, user.password_hash()) => user,
            _ => {
                warn!("Failed login attempt");
                return Err(DomainError::unauthorized(INVALID_CREDENTIALS));
            }
        };

        let tokens = self.issue_pair(&user).await?;

        info!(user_id = %user.id(), "User logged in");
        Ok(LoginResult {
            tokens,
            user: UserProfile::from_user(&user, Utc::now()),
        })
    }

    /// Rotate: revoke the presented session and open a new one
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let claims = self
            .jwt
            .verify(refresh_token, TokenType::Refresh)
            .map_err(|_| DomainError::unauthorized(INVALID_REFRESH))?;
        let jti = claims
            .jti
            .as_deref()
            .ok_or_else(|| DomainError::unauthorized(INVALID_REFRESH))?;

        let session = self
            .sessions
            .get(jti)
            .await?
            .filter(|s| s.is_usable_at(Utc::now()))
            .ok_or_else(|| DomainError::unauthorized(INVALID_REFRESH))?;

        // A concurrent refresh with the same token loses here
        if !self.sessions.revoke(&session.jti).await? {
            return Err(DomainError::unauthorized(INVALID_REFRESH));
        }

        let user = self
            .users
            .get(&session.user_id)
            .await?
            .ok_or_else(|| DomainError::unauthorized(INVALID_REFRESH))?;

        self.issue_pair(&user).await
    }

    /// Revoke the presented session. Unknown or malformed tokens are ignored.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), DomainError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        if let Ok(claims) = self.jwt.verify(token, TokenType::Refresh) {
            if let Some(jti) = claims.jti {
                self.sessions.revoke(&jti).await?;
            }
        }

        Ok(())
    }

    /// Revoke every refresh session of a user, returning the count
    pub async fn logout_all(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let revoked = self.sessions.revoke_all(user_id).await?;
        info!(user_id = %user_id, revoked, "Revoked all sessions");
        Ok(revoked)
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, DomainError> {
        let access_token = self.jwt.issue_access(user)?;
        let refresh = self.jwt.issue_refresh(user)?;
        self.sessions.create(refresh.session).await?;

        Ok(TokenPair {
            access_token,
            refresh_token: refresh.token,
            refresh_max_age_secs: self.jwt.refresh_ttl_secs(),
        })
    }
}
