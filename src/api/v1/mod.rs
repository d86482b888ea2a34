//! Versioned HTTP endpoints

pub mod ai;
pub mod archives;
pub mod auth;
pub mod notes;
pub mod templates;
pub mod users;
pub mod views;

use axum::{
    routing::{get, patch, post},
    Router,
};
use uuid::Uuid;

use super::state::AppState;
use super::types::ApiError;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/ai/generate-email", post(ai::generate_email))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout-all", post(auth::logout_all))
        .route("/users/me", get(users::get_me).patch(users::update_me))
        .route("/users/me/usage", get(users::get_my_usage))
        .route("/archives", get(archives::list_archives))
        .route(
            "/archives/{id}",
            get(archives::get_archive).delete(archives::delete_archive),
        )
        .route(
            "/templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/templates/{id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/{id}/star", patch(notes::toggle_star))
}

/// A malformed id cannot name an existing record
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}
