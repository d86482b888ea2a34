//! Profile and usage endpoints

use axum::extract::{Query, State};
use serde::Deserialize;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Json};
use crate::infrastructure::usage::DEFAULT_STATS_DAYS;
use crate::infrastructure::user::{UpdateProfileRequest, UserProfile};

use super::views::UsageDayView;

#[derive(Debug, Default, Deserialize)]
pub struct UsageStatsQuery {
    pub days: Option<u32>,
}

/// GET /v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<ApiResponse<UserProfile>, ApiError> {
    let profile = state.users.get_profile(&user.id).await?;
    Ok(ApiResponse::ok(profile))
}

/// PATCH /v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<ApiResponse<UserProfile>, ApiError> {
    let profile = state.users.update_profile(&user.id, request).await?;
    Ok(ApiResponse::ok(profile))
}

/// GET /v1/users/me/usage?days=7
pub async fn get_my_usage(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<UsageStatsQuery>,
) -> Result<ApiResponse<Vec<UsageDayView>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_STATS_DAYS);
    let rows = state.usage.get_usage_stats(&user.id, days).await?;

    Ok(ApiResponse::ok(rows.into_iter().map(UsageDayView::from).collect()))
}
