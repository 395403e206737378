//! Route definitions for the `/tunes` resource and its editor sessions.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{editor, tunes};
use crate::state::AppState;

/// Routes mounted at `/tunes`.
///
/// ```text
/// GET    /{id}               -> get_tune
/// PUT    /{id}               -> update_tune (owner or admin)
/// GET    /{id}/edit          -> open_editor (redirect if not permitted)
/// DELETE /{id}/edit          -> close_editor
/// POST   /{id}/edit/changes  -> apply_change
/// POST   /{id}/edit/undo     -> undo
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(tunes::get_tune).put(tunes::update_tune))
        .route(
            "/{id}/edit",
            get(editor::open_editor).delete(editor::close_editor),
        )
        .route("/{id}/edit/changes", post(editor::apply_change))
        .route("/{id}/edit/undo", post(editor::undo))
}
