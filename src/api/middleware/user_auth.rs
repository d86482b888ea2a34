//! Bearer-token extractors

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::user::UserId;
use crate::infrastructure::auth::{JwtService, TokenType};

/// Identity carried by a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
}

/// Requires `Authorization: Bearer <access token>`
#[derive(Debug, Clone)]
pub struct RequireUser(pub AuthUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or_else(|| {
            ApiError::unauthorized("Authentication required")
        })?;

        authenticate(state.auth.jwt(), token)
            .map(RequireUser)
            .map_err(ApiError::from)
    }
}

/// The caller's identity when a valid access token is present; a missing or
/// invalid token makes the caller a guest
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = extract_bearer_token(&parts.headers).and_then(|token| {
            authenticate(state.auth.jwt(), token)
                .map_err(|e| debug!(error = %e, "Ignoring invalid bearer token"))
                .ok()
        });

        Ok(OptionalUser(user))
    }
}

fn authenticate(jwt: &JwtService, token: &str) -> Result<AuthUser, crate::domain::DomainError> {
    let claims = jwt.verify(token, TokenType::Access)?;

    Ok(AuthUser {
        id: claims.user_id()?,
        email: claims.email,
    })
}

/// Token from `Authorization: Bearer <token>`
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, "Bearer   padded  ".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("padded"));
    }

    #[test]
    fn test_non_bearer_schemes_ignored() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
