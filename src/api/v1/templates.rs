//! Template endpoints

use axum::extract::{Path, Query, State};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Created, Json};
use crate::domain::listing::{ListQuery, Page};
use crate::infrastructure::template::{
    CreateTemplateRequest, TemplateCreated, UpdateTemplateRequest,
};

use super::parse_id;
use super::views::{page_view, TemplateView};

/// GET /v1/templates
pub async fn list_templates(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Page<TemplateView>>, ApiError> {
    let page = state.templates.find_all(&user.id, query).await?;
    Ok(ApiResponse::ok(page_view(page)))
}

/// POST /v1/templates
pub async fn create_template(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<Created<TemplateCreated>, ApiError> {
    let created = state.templates.create(&user.id, request).await?;
    Ok(Created(created))
}

/// GET /v1/templates/{id}
pub async fn get_template(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<TemplateView>, ApiError> {
    let template = state
        .templates
        .find_one(&user.id, parse_id(&id, "Template")?)
        .await?;

    Ok(ApiResponse::ok(template.into()))
}

/// PUT /v1/templates/{id}
pub async fn update_template(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateTemplateRequest>,
) -> Result<ApiResponse<TemplateView>, ApiError> {
    let template = state
        .templates
        .update(&user.id, parse_id(&id, "Template")?, request)
        .await?;

    Ok(ApiResponse::ok(template.into()))
}

/// DELETE /v1/templates/{id}
pub async fn delete_template(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state
        .templates
        .delete(&user.id, parse_id(&id, "Template")?)
        .await?;

    Ok(ApiResponse::empty())
}
