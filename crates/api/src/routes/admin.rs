use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin` (admin role required).
///
/// ```text
/// POST   /tunes  -> create_tune
/// DELETE /tunes  -> delete_tune (JSON body `{id}` or `{_id}`)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/tunes",
        post(admin::create_tune).delete(admin::delete_tune),
    )
}
