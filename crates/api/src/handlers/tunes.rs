//! Handlers for the `/tunes` resource.

use axum::extract::{Path, State};
use axum::Json;
use harmolyze_core::error::CoreError;
use harmolyze_core::scoring::calculate_points;
use harmolyze_core::types::DbId;
use harmolyze_db::models::tune::Tune;
use harmolyze_db::repositories::TuneRepo;
use harmolyze_editor::{SinkError, TuneUpdate};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `PUT /tunes/{id}`.
///
/// Mirrors the autosave payload `{id, abc, points}`. `points` is accepted but
/// recomputed from `abc`.
#[derive(Debug, Deserialize)]
pub struct UpdateTuneRequest {
    #[serde(default, alias = "_id")]
    pub id: Option<DbId>,
    pub abc: String,
    #[serde(default)]
    pub points: Option<i64>,
}

/// Load a tune or fail with 404.
pub(crate) async fn find_tune(state: &AppState, id: DbId) -> AppResult<Tune> {
    TuneRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Tune", id }))
}

/// GET /api/v1/tunes/{id}
pub async fn get_tune(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Tune>>> {
    let tune = find_tune(&state, id).await?;
    Ok(Json(DataResponse { data: tune }))
}

/// PUT /api/v1/tunes/{id}
///
/// Persist a new ABC body through the autosave queue and wait for the
/// write. Only the creator or an admin may write.
pub async fn update_tune(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTuneRequest>,
) -> AppResult<Json<DataResponse<Tune>>> {
    if input.id.is_some_and(|body_id| body_id != id) {
        return Err(AppError::BadRequest(format!(
            "Body id does not match path id {id}"
        )));
    }

    let tune = find_tune(&state, id).await?;
    if !user.may_edit(tune.created_by) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Only the creator or an admin may edit this tune".into(),
        )));
    }

    let points = calculate_points(&input.abc);
    if input.points.is_some_and(|claimed| claimed != i64::from(points)) {
        tracing::debug!(
            tune_id = id,
            claimed = ?input.points,
            points,
            "Client points differ, using computed"
        );
    }

    if i32::try_from(points).is_err() {
        return Err(AppError::BadRequest("Tune is too large to score".into()));
    }

    // Same queue as editor autosaves, so writes to one tune never overlap.
    let update = TuneUpdate {
        tune_id: id,
        abc: input.abc,
        points,
        revision: 0,
    };
    state.autosave.save(update).await.map_err(|e| match e {
        SinkError::NotFound(id) => AppError::Core(CoreError::NotFound { entity: "Tune", id }),
        other => AppError::InternalError(other.to_string()),
    })?;
    let updated = find_tune(&state, id).await?;

    tracing::info!(
        tune_id = id,
        user_id = user.user_id,
        points = updated.points,
        "Tune updated"
    );
    Ok(Json(DataResponse { data: updated }))
}
