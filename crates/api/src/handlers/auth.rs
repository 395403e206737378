//! Handlers for the `/auth` resource (signup, login, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use harmolyze_core::error::CoreError;
use harmolyze_core::roles::DEFAULT_ROLE_ID;
use harmolyze_core::signup::{SignupForm, MSG_NAME_TAKEN, MSG_UNKNOWN_ERROR};
use harmolyze_core::types::DbId;
use harmolyze_db::models::session::CreateSession;
use harmolyze_db::models::user::CreateUser;
use harmolyze_db::repositories::{RoleRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::handlers::avatars::list_avatar_urls;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Maximum consecutive failed login attempts before locking the account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Duration in minutes to lock an account after exceeding failed attempts.
const LOCK_DURATION_MINS: i64 = 15;

const USERNAME_CONSTRAINT: &str = "uq_users_username";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub name: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by signup, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`AuthResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub name: String,
    pub image: Option<String>,
    pub role: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Create an account with the default role and sign it in. A taken name
/// yields 409 with the fixed German message; any other failure after
/// validation yields the generic unknown-error message.
pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    form.validate()?;

    if let Some(image) = &form.image {
        let avatars = list_avatar_urls(&state.config.avatar_dir)
            .await
            .map_err(|e| unknown("list avatars", e))?;
        if !avatars.contains(image) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unbekanntes Profilbild: {image}"
            ))));
        }
    }

    let existing = UserRepo::find_by_username(&state.pool, &form.name)
        .await
        .map_err(|e| unknown("look up user name", e))?;
    if existing.is_some() {
        return Err(AppError::Core(CoreError::Conflict(MSG_NAME_TAKEN.into())));
    }

    let password_hash =
        hash_password(&form.password).map_err(|e| unknown("hash password", e))?;

    let input = CreateUser {
        username: form.name,
        password_hash,
        image: form.image,
        role_id: DEFAULT_ROLE_ID,
    };
    let user = match UserRepo::create(&state.pool, &input).await {
        Ok(user) => user,
        // Lost a race against a concurrent signup with the same name.
        Err(e) if is_unique_violation(&e, USERNAME_CONSTRAINT) => {
            return Err(AppError::Core(CoreError::Conflict(MSG_NAME_TAKEN.into())));
        }
        Err(e) => return Err(unknown("create user", e)),
    };

    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id)
        .await
        .map_err(|e| unknown("resolve role", e))?;

    tracing::info!(user_id = user.id, name = %user.username, "User signed up");

    let response = create_auth_response(
        &state,
        user.id,
        &user.username,
        user.image.as_deref(),
        &role_name,
    )
    .await
    .map_err(|e| unknown("create session", e))?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with name + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    // 1. Find user by name.
    let user = UserRepo::find_by_username(&state.pool, &input.name)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid name or password".into()))
        })?;

    // 2. Check if the account is active.
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    // 3. Check if the account is temporarily locked.
    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Account is temporarily locked. Try again later.".into(),
            )));
        }
    }

    // 4. Verify password.
    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        // 5. On failure: increment counter, lock if threshold exceeded.
        UserRepo::increment_failed_login(&state.pool, user.id).await?;

        let new_count = user.failed_login_count + 1;
        if new_count >= MAX_FAILED_ATTEMPTS {
            let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, lock_until).await?;
            tracing::warn!(user_id = user.id, "Account locked after failed logins");
        }

        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid name or password".into(),
        )));
    }

    // 6. On success: reset failed count, set last_login_at.
    UserRepo::record_successful_login(&state.pool, user.id).await?;

    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    let response = create_auth_response(
        &state,
        user.id,
        &user.username,
        user.image.as_deref(),
        &role_name,
    )
    .await?;

    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for new access + refresh tokens.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_by_refresh_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ))
        })?;

    // Token rotation: the presented token is single-use.
    SessionRepo::revoke(&state.pool, session.id).await?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    let response = create_auth_response(
        &state,
        user.id,
        &user.username,
        user.image.as_deref(),
        &role_name,
    )
    .await?;

    Ok(Json(response))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated user and close their editors.
/// Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    let closed = state.editors.close_user(auth_user.user_id).await;
    tracing::info!(user_id = auth_user.user_id, closed, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(
    state: &AppState,
    user_id: DbId,
    name: &str,
    image: Option<&str>,
    role: &str,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user_id, name, role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();

    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    let session_input = CreateSession {
        user_id,
        refresh_token_hash: refresh_hash,
        expires_at,
        user_agent: None,
        ip_address: None,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh_plaintext,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserInfo {
            id: user_id,
            name: name.to_string(),
            image: image.map(str::to_string),
            role: role.to_string(),
        },
    })
}

/// Log `err` and hide it behind the generic signup failure message.
fn unknown(action: &str, err: impl std::fmt::Display) -> AppError {
    tracing::error!(error = %err, action, "Signup failed");
    AppError::Unknown(MSG_UNKNOWN_ERROR.into())
}
