//! Selectable avatar images.

use std::io;

use axum::extract::State;
use axum::Json;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// URL prefix under which the avatar directory is served.
pub const AVATAR_URL_PREFIX: &str = "/avatars";

/// Public URLs of all files in `dir`, sorted by file name.
///
/// Hidden files and subdirectories are skipped. A missing directory yields
/// an empty list.
pub async fn list_avatar_urls(dir: &str) -> io::Result<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();

    Ok(names
        .into_iter()
        .map(|name| format!("{AVATAR_URL_PREFIX}/{name}"))
        .collect())
}

/// GET /api/v1/avatars
pub async fn list_avatars(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let urls = list_avatar_urls(&state.config.avatar_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to list avatars: {e}")))?;
    Ok(Json(DataResponse { data: urls }))
}
