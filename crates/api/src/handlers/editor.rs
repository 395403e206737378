//! Handlers for the `/tunes/{id}/edit` resource (editor sessions).
//!
//! An editor session keeps the edit history of one tune for one user and
//! autosaves every change of the newest snapshot.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use harmolyze_core::error::CoreError;
use harmolyze_core::types::DbId;
use harmolyze_editor::{AutosaveStatus, EditorSnapshot};
use serde::{Deserialize, Serialize};

use crate::editor::SharedSession;
use crate::error::{AppError, AppResult};
use crate::handlers::tunes::find_tune;
use crate::middleware::auth::AuthUser;
use crate::response::{signin_redirect, DataResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /tunes/{id}/edit/changes`.
#[derive(Debug, Deserialize)]
pub struct ChangeRequest {
    pub abc: String,
}

/// Editor state returned by every editor endpoint.
#[derive(Debug, Serialize)]
pub struct EditorView {
    #[serde(flatten)]
    pub snapshot: EditorSnapshot,
    pub autosave: Option<AutosaveStatus>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/tunes/{id}/edit
///
/// Open or resume the caller's editor session. Callers without a session or
/// without edit rights on the tune are sent to the sign-in page.
pub async fn open_editor(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let Some(user) = user else {
        return Ok(signin_redirect(&state.config.signin_path));
    };

    let tune = find_tune(&state, id).await?;
    if !user.may_edit(tune.created_by) {
        tracing::info!(tune_id = id, user_id = user.user_id, "Editor access denied");
        return Ok(signin_redirect(&state.config.signin_path));
    }

    // Re-read after pending autosaves so the seed is the newest stored body.
    let reader = state.clone();
    let session = state
        .editors
        .open_or_resume(user.user_id, id, state.autosave.clone(), move || async move {
            find_tune(&reader, id).await.map(|tune| tune.abc)
        })
        .await?;
    let snapshot = session.lock().await.snapshot();

    Ok(Json(DataResponse {
        data: view(&state, snapshot).await,
    })
    .into_response())
}

/// POST /api/v1/tunes/{id}/edit/changes
///
/// Append a snapshot to the history and autosave it.
pub async fn apply_change(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<ChangeRequest>,
) -> AppResult<Json<DataResponse<EditorView>>> {
    let session = open_session(&state, &user, id).await?;
    let snapshot = session.lock().await.edit(input.abc).await;
    Ok(Json(DataResponse {
        data: view(&state, snapshot).await,
    }))
}

/// POST /api/v1/tunes/{id}/edit/undo
///
/// Revert the newest edit. 409 when only the seed snapshot remains.
pub async fn undo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<EditorView>>> {
    let session = open_session(&state, &user, id).await?;
    let snapshot = session
        .lock()
        .await
        .undo()
        .await
        .ok_or_else(|| AppError::Core(CoreError::Conflict("Nothing to undo".into())))?;
    Ok(Json(DataResponse {
        data: view(&state, snapshot).await,
    }))
}

/// DELETE /api/v1/tunes/{id}/edit
///
/// Close the editor session and discard its history. Already queued
/// autosaves still complete.
pub async fn close_editor(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !state.editors.close(user.user_id, id).await {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "EditorSession",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn open_session(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<SharedSession> {
    state
        .editors
        .get(user.user_id, id)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "EditorSession",
            id,
        }))
}

async fn view(state: &AppState, snapshot: EditorSnapshot) -> EditorView {
    let autosave = state.autosave.status(snapshot.tune_id).await;
    EditorView { snapshot, autosave }
}
