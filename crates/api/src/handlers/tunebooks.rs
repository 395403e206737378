//! Handlers for the `/tunebooks` resource.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use harmolyze_db::repositories::TunebookRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::{signin_redirect, DataResponse};
use crate::state::AppState;

/// GET /api/v1/tunebooks
///
/// Tunebooks with their tunes, easiest tune first. Empty tunebooks are left
/// out. Sessionless callers are sent to the sign-in page.
pub async fn list_tunebooks(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> AppResult<Response> {
    if user.is_none() {
        return Ok(signin_redirect(&state.config.signin_path));
    }

    let tunebooks = TunebookRepo::list_with_tunes(&state.pool).await?;
    Ok(Json(DataResponse { data: tunebooks }).into_response())
}
