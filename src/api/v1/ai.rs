//! Email generation endpoint

use axum::extract::State;
use tracing::debug;

use crate::api::middleware::{ClientIp, OptionalUser};
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json};
use crate::domain::generation::{GenerateEmailInput, GenerationResult};
use crate::domain::rate_limit::{guest_key, GUEST_LIMIT_MESSAGE};
use crate::domain::DomainError;

/// POST /v1/ai/generate-email
pub async fn generate_email(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    ClientIp(ip): ClientIp,
    Json(input): Json<GenerateEmailInput>,
) -> Result<ApiResponse<GenerationResult>, ApiError> {
    if user.is_none() {
        enforce_guest_limit(&state, &ip).await?;
    }

    let result = state
        .generation
        .generate(user.as_ref().map(|u| &u.id), input)
        .await?;

    Ok(ApiResponse::ok(result))
}

async fn enforce_guest_limit(state: &AppState, ip: &str) -> Result<(), DomainError> {
    let window = state
        .guest_limiter
        .increment(&guest_key(ip), state.guest_rule.window_secs)
        .await?;

    debug!(ip = %ip, count = window.count, "Guest generation");

    if state.guest_rule.allows(&window) {
        Ok(())
    } else {
        Err(DomainError::rate_limited(
            GUEST_LIMIT_MESSAGE,
            window.expires_in,
        ))
    }
}
