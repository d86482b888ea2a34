//! HS256 access and refresh tokens

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

use crate::domain::session::RefreshSession;
use crate::domain::user::{User, UserId};
use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User ID
    pub sub: String,
    pub email: String,
    pub typ: TokenType,
    /// Session ID, refresh tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    fn new(user: &User, typ: TokenType, jti: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user.id().to_string(),
            email: user.email().to_string(),
            typ,
            jti,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    pub fn user_id(&self) -> Result<UserId, DomainError> {
        UserId::parse(&self.sub).ok_or_else(|| DomainError::unauthorized("Invalid token subject"))
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }
}

/// A freshly signed refresh token and the session it opens
#[derive(Debug, Clone)]
pub struct IssuedRefresh {
    pub token: String,
    pub session: RefreshSession,
}

#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("access_ttl_secs", &self.config.access_ttl_secs)
            .field("refresh_ttl_secs", &self.config.refresh_ttl_secs)
            .field("keys", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.config.refresh_ttl_secs
    }

    fn sign(&self, claims: &JwtClaims) -> Result<String, DomainError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| DomainError::internal(format!("Failed to sign JWT: {}", e)))
    }

    pub fn issue_access(&self, user: &User) -> Result<String, DomainError> {
        let ttl = Duration::seconds(self.config.access_ttl_secs as i64);
        self.sign(&JwtClaims::new(user, TokenType::Access, None, ttl))
    }

    pub fn issue_refresh(&self, user: &User) -> Result<IssuedRefresh, DomainError> {
        let ttl = Duration::seconds(self.config.refresh_ttl_secs as i64);
        let jti = Uuid::new_v4().simple().to_string();
        let claims = JwtClaims::new(user, TokenType::Refresh, Some(jti.clone()), ttl);

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| DomainError::internal("Refresh expiry out of range"))?;

        Ok(IssuedRefresh {
            token: self.sign(&claims)?,
            session: RefreshSession::new(jti, user.id(), expires_at),
        })
    }

    /// Check signature, expiry and token type
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<JwtClaims, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| DomainError::unauthorized(format!("Invalid token: {}", e)))?
            .claims;

        if claims.typ != expected {
            return Err(DomainError::unauthorized("Invalid token type"));
        }

        if expected == TokenType::Refresh && claims.jti.is_none() {
            return Err(DomainError::unauthorized("Refresh token without session"));
        }

        Ok(claims)
    }
}
