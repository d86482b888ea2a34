//! Archive endpoints

use axum::extract::{Path, Query, State};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse};
use crate::domain::listing::{ListQuery, Page};

use super::parse_id;
use super::views::{page_view, ArchiveView};

/// GET /v1/archives
pub async fn list_archives(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Page<ArchiveView>>, ApiError> {
    let page = state.archives.find_all(&user.id, query).await?;
    Ok(ApiResponse::ok(page_view(page)))
}

/// GET /v1/archives/{id}
pub async fn get_archive(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<ArchiveView>, ApiError> {
    let archive = state
        .archives
        .find_one(&user.id, parse_id(&id, "Archive")?)
        .await?;

    Ok(ApiResponse::ok(archive.into()))
}

/// DELETE /v1/archives/{id}
pub async fn delete_archive(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .archives
        .delete(&user.id, parse_id(&id, "Archive")?)
        .await?;

    Ok(ApiResponse::empty())
}
