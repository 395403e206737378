use axum::routing::get;
use axum::Router;

use crate::handlers::avatars;
use crate::state::AppState;

/// Routes mounted at `/avatars`. The image files themselves are served
/// outside `/api/v1`, see [`crate::router::build_app_router`].
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(avatars::list_avatars))
}
