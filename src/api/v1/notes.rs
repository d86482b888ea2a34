//! Expression note endpoints

use axum::extract::{Path, Query, State};
use serde::Serialize;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ApiResponse, Created, Json};
use crate::domain::note::NoteQuery;
use crate::infrastructure::note::{CreateNoteRequest, Pagination, UpdateNoteRequest};

use super::parse_id;
use super::views::NoteView;

#[derive(Debug, Serialize)]
pub struct NoteListView {
    pub notes: Vec<NoteView>,
    pub pagination: Pagination,
}

/// GET /v1/notes
pub async fn list_notes(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(query): Query<NoteQuery>,
) -> Result<ApiResponse<NoteListView>, ApiError> {
    let list = state.notes.list(&user.id, query).await?;

    Ok(ApiResponse::ok(NoteListView {
        notes: list.notes.into_iter().map(NoteView::from).collect(),
        pagination: list.pagination,
    }))
}

/// POST /v1/notes
pub async fn create_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<CreateNoteRequest>,
) -> Result<Created<NoteView>, ApiError> {
    let note = state.notes.create(&user.id, request).await?;
    Ok(Created(note.into()))
}

/// GET /v1/notes/{id}
pub async fn get_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<NoteView>, ApiError> {
    let note = state.notes.get(&user.id, parse_id(&id, "Note")?).await?;
    Ok(ApiResponse::ok(note.into()))
}

/// PUT /v1/notes/{id}
pub async fn update_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<ApiResponse<NoteView>, ApiError> {
    let note = state
        .notes
        .update(&user.id, parse_id(&id, "Note")?, request)
        .await?;

    Ok(ApiResponse::ok(note.into()))
}

/// PATCH /v1/notes/{id}/star
pub async fn toggle_star(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<NoteView>, ApiError> {
    let note = state
        .notes
        .toggle_star(&user.id, parse_id(&id, "Note")?)
        .await?;

    Ok(ApiResponse::ok(note.into()))
}

/// DELETE /v1/notes/{id}
pub async fn delete_note(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state.notes.delete(&user.id, parse_id(&id, "Note")?).await?;
    Ok(ApiResponse::empty())
}
