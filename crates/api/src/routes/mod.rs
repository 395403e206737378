pub mod admin;
pub mod auth;
pub mod avatars;
pub mod health;
pub mod tunebooks;
pub mod tunes;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                    create account (public)
/// /auth/login                     login (public)
/// /auth/refresh                   refresh (public)
/// /auth/logout                    logout (requires auth)
///
/// /avatars                        selectable avatar URLs (public)
///
/// /tunebooks                      tunebook listing (redirect without session)
///
/// /tunes/{id}                     get, update (owner or admin)
/// /tunes/{id}/edit                open/resume (redirect if not permitted), close
/// /tunes/{id}/edit/changes        append snapshot (POST)
/// /tunes/{id}/edit/undo           undo newest snapshot (POST)
///
/// /admin/tunes                    create (POST), delete by payload (DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/avatars", avatars::router())
        .nest("/tunebooks", tunebooks::router())
        .nest("/tunes", tunes::router())
        .nest("/admin", admin::router())
}
