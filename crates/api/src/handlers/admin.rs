//! Admin-only tune management.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use harmolyze_core::abc::header_field;
use harmolyze_core::error::CoreError;
use harmolyze_core::scoring::calculate_points;
use harmolyze_core::types::DbId;
use harmolyze_db::models::tune::{CreateTune, Tune};
use harmolyze_db::repositories::{TuneRepo, TunebookRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_DIFFICULTY: i16 = 1;

/// Request body for `POST /admin/tunes`.
#[derive(Debug, Deserialize)]
pub struct CreateTuneRequest {
    /// Falls back to the `T:` header field of `abc`.
    pub title: Option<String>,
    pub abc: String,
    pub difficulty: Option<i16>,
    /// Tunebook to file the new tune under.
    pub tunebook_id: Option<DbId>,
    #[serde(default)]
    pub position: i32,
}

/// Request body for `DELETE /admin/tunes`: a tune payload identified by `id`
/// (`_id` accepted). Other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct DeleteTuneRequest {
    #[serde(alias = "_id")]
    pub id: DbId,
}

/// POST /api/v1/admin/tunes
pub async fn create_tune(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateTuneRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Tune>>)> {
    if input.abc.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "abc must not be empty".into(),
        )));
    }

    let title = input
        .title
        .filter(|t| !t.trim().is_empty())
        .or_else(|| header_field(&input.abc, 'T').map(str::to_string))
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "title is required when abc has no T: field".into(),
            ))
        })?;

    if let Some(tunebook_id) = input.tunebook_id {
        TunebookRepo::find_by_id(&state.pool, tunebook_id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Tunebook",
                id: tunebook_id,
            }))?;
    }

    let points = i32::try_from(calculate_points(&input.abc))
        .map_err(|_| AppError::BadRequest("Tune is too large to score".into()))?;
    let create = CreateTune {
        title,
        abc: input.abc,
        difficulty: input.difficulty.unwrap_or(DEFAULT_DIFFICULTY),
        points,
        created_by: admin.user_id,
    };
    let tune = TuneRepo::create(&state.pool, &create).await?;

    if let Some(tunebook_id) = input.tunebook_id {
        TunebookRepo::add_tune(&state.pool, tunebook_id, tune.id, input.position).await?;
    }

    tracing::info!(tune_id = tune.id, admin_id = admin.user_id, "Tune created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: tune })))
}

/// DELETE /api/v1/admin/tunes
///
/// Close every editor session on the tune, let its queued autosaves land,
/// then remove it.
pub async fn delete_tune(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<DeleteTuneRequest>,
) -> AppResult<StatusCode> {
    let closed = state.editors.close_tune(input.id).await;
    state.autosave.flush_tune(input.id).await;
    if !TuneRepo::delete(&state.pool, input.id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Tune",
            id: input.id,
        }));
    }
    state.autosave.forget(input.id).await;
    tracing::info!(tune_id = input.id, admin_id = admin.user_id, closed, "Tune deleted");
    Ok(StatusCode::NO_CONTENT)
}
