//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope per project conventions.
//! Use [`DataResponse`] instead of ad-hoc `serde_json::json!({ "data": ... })`
//! to get compile-time type safety and consistent serialization.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: tunebooks }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `303 See Other` to the sign-in page, used where a page view needs a
/// session the caller does not have.
pub fn signin_redirect(signin_path: &str) -> axum::response::Response {
    use axum::response::IntoResponse;
    axum::response::Redirect::to(signin_path).into_response()
}
