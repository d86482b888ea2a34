//! Signup, login and refresh-session endpoints

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{AppendHeaders, IntoResponse},
};
use serde::Serialize;

use crate::api::middleware::RequireUser;
use crate::api::state::{AppState, CookieSettings};
use crate::api::types::{ApiError, ApiResponse, Created, Json};
use crate::domain::DomainError;
use crate::infrastructure::auth::{LoginRequest, SignupRequest};
use crate::infrastructure::user::UserProfile;

pub const REFRESH_COOKIE: &str = "refreshToken";
const COOKIE_PATH: &str = "/v1/auth";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

/// POST /v1/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Created<UserProfile>, ApiError> {
    let profile = state.auth.signup(request).await?;
    Ok(Created(profile))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.auth.login(request).await?;
    let cookie = refresh_cookie(
        &result.tokens.refresh_token,
        result.tokens.refresh_max_age_secs,
        state.cookies,
    )?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        ApiResponse::ok(LoginResponse {
            access_token: result.tokens.access_token,
            user: result.user,
        }),
    ))
}

/// POST /v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = read_cookie(&headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::unauthorized("Refresh token missing"))?;

    let tokens = state.auth.refresh(token).await?;
    let cookie = refresh_cookie(
        &tokens.refresh_token,
        tokens.refresh_max_age_secs,
        state.cookies,
    )?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        ApiResponse::ok(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

/// POST /v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth
        .logout(read_cookie(&headers, REFRESH_COOKIE))
        .await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, expired_cookie(state.cookies)?)]),
        ApiResponse::empty(),
    ))
}

/// POST /v1/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<impl IntoResponse, ApiError> {
    let revoked = state.auth.logout_all(&user.id).await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, expired_cookie(state.cookies)?)]),
        ApiResponse::ok(LogoutAllResponse { revoked }),
    ))
}

/// Value of cookie `name` from the `Cookie` headers
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn cookie_header(
    value: &str,
    max_age: u64,
    settings: CookieSettings,
) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite=Lax",
        REFRESH_COOKIE, value, COOKIE_PATH, max_age
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::from(DomainError::internal(format!("Invalid cookie: {}", e))))
}

pub fn refresh_cookie(
    token: &str,
    max_age_secs: u64,
    settings: CookieSettings,
) -> Result<HeaderValue, ApiError> {
    cookie_header(token, max_age_secs, settings)
}

pub fn expired_cookie(settings: CookieSettings) -> Result<HeaderValue, ApiError> {
    cookie_header("", 0, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; refreshToken=abc.def.ghi; other=1".parse().unwrap(),
        );

        assert_eq!(read_cookie(&headers, REFRESH_COOKIE), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = refresh_cookie("tok", 604_800, CookieSettings { secure: true }).unwrap();
        let cookie = cookie.to_str().unwrap();

        assert!(cookie.starts_with("refreshToken=tok;"));
        assert!(cookie.contains("Path=/v1/auth"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = expired_cookie(CookieSettings { secure: false }).unwrap();
        assert_eq!(
            cleared.to_str().unwrap(),
            "refreshToken=; Path=/v1/auth; Max-Age=0; HttpOnly; SameSite=Lax"
        );
    }
}
