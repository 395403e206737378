//! HTTP-level integration tests for tunes, tunebooks, editor sessions and
//! admin tune management.

mod common;

use axum::http::header::LOCATION;
use axum::http::StatusCode;
use common::{
    body_json, create_test_tune, create_test_user, delete_auth, delete_json_auth, get, get_auth,
    post_json_auth, put_json_auth, token_for, ADMIN_ROLE_ID, SIGNIN_PATH, USER_ROLE_ID,
};
use harmolyze_db::models::tunebook::CreateTunebook;
use harmolyze_db::repositories::{TuneRepo, TunebookRepo};
use sqlx::PgPool;

const SEED: &str = "X:1\nT:Test\nK:C\nC";
const EDITED: &str = "X:1\nT:Test\nK:C\nCC";

fn assert_signin_redirect(response: &axum::response::Response) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], SIGNIN_PATH);
}

// ---------------------------------------------------------------------------
// Tunebooks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_tunebooks_redirect_without_session(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/tunebooks").await;
    assert_signin_redirect(&response);
}

/// Tunes are ordered by difficulty, empty tunebooks are left out.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_tunebooks_listing(pool: PgPool) {
    let user = create_test_user(&pool, "reader", USER_ROLE_ID).await;
    let book = TunebookRepo::create(&pool, &CreateTunebook { name: "Choräle".into() })
        .await
        .unwrap();
    TunebookRepo::create(&pool, &CreateTunebook { name: "Leer".into() })
        .await
        .unwrap();

    let hard = create_test_tune(&pool, user.id, SEED).await;
    sqlx::query("UPDATE tunes SET difficulty = 3 WHERE id = $1")
        .bind(hard.id)
        .execute(&pool)
        .await
        .unwrap();
    let easy = create_test_tune(&pool, user.id, EDITED).await;
    TunebookRepo::add_tune(&pool, book.id, hard.id, 0).await.unwrap();
    TunebookRepo::add_tune(&pool, book.id, easy.id, 1).await.unwrap();

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/tunebooks",
        &token_for(&user),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let books = json["data"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["name"], "Choräle");
    let tune_ids: Vec<i64> = books[0]["tunes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(tune_ids, vec![easy.id, hard.id]);
    assert!(books[0]["tunes"][0].get("abc").is_none());
}

// ---------------------------------------------------------------------------
// Tunes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_tune(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/tunes/{}", tune.id),
        &token_for(&owner),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["abc"], SEED);
    assert_eq!(json["data"]["points"], 1);

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/tunes/999999",
        &token_for(&owner),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// The server recomputes points instead of trusting the client.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_tune_recomputes_points(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let body = serde_json::json!({ "id": tune.id, "abc": EDITED, "points": 99 });
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/tunes/{}", tune.id),
        body,
        &token_for(&owner),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let stored = TuneRepo::find_by_id(&pool, tune.id).await.unwrap().unwrap();
    assert_eq!(stored.abc, EDITED);
    assert_eq!(stored.points, 2);
}

/// A PUT goes through the autosave queue: it lands after the editor's
/// queued edit and its response already reflects the stored body.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_tune_ordered_after_editor_autosave(pool: PgPool) {
    const PUT_BODY: &str = "X:1\nT:Test\nK:C\nCCC";
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;
    let token = token_for(&owner);
    let state = common::test_state(pool.clone());
    let edit_uri = format!("/api/v1/tunes/{}/edit", tune.id);

    get_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    post_json_auth(
        common::build_app(state.clone()),
        &format!("{edit_uri}/changes"),
        serde_json::json!({ "abc": EDITED }),
        &token,
    )
    .await;

    let response = put_json_auth(
        common::build_app(state.clone()),
        &format!("/api/v1/tunes/{}", tune.id),
        serde_json::json!({ "abc": PUT_BODY }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["abc"], PUT_BODY);
    assert_eq!(json["data"]["points"], 3);

    let stored = TuneRepo::find_by_id(&pool, tune.id).await.unwrap().unwrap();
    assert_eq!(stored.abc, PUT_BODY);

    state.autosave.flush().await;
    let stored = TuneRepo::find_by_id(&pool, tune.id).await.unwrap().unwrap();
    assert_eq!(stored.abc, PUT_BODY);
    assert_eq!(state.autosave.revision(tune.id).await, 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_tune_forbidden_for_other_user(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let other = create_test_user(&pool, "other", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/tunes/{}", tune.id),
        serde_json::json!({ "abc": EDITED }),
        &token_for(&other),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let stored = TuneRepo::find_by_id(&pool, tune.id).await.unwrap().unwrap();
    assert_eq!(stored.abc, SEED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_tune_rejects_mismatched_id(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/tunes/{}", tune.id),
        serde_json::json!({ "_id": tune.id + 1, "abc": EDITED }),
        &token_for(&owner),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Editor sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_editor_redirects_without_session(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let response = get(
        common::build_test_app(pool),
        &format!("/api/v1/tunes/{}/edit", tune.id),
    )
    .await;
    assert_signin_redirect(&response);
}

/// A non-owner without admin rights is sent to the sign-in page.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_editor_redirects_non_owner(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let other = create_test_user(&pool, "other", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/tunes/{}/edit", tune.id),
        &token_for(&other),
    )
    .await;
    assert_signin_redirect(&response);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_may_open_foreign_tune(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let admin = create_test_user(&pool, "admin", ADMIN_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;
    let state = common::test_state(pool);

    let response = get_auth(
        common::build_app(state.clone()),
        &format!("/api/v1/tunes/{}/edit", tune.id),
        &token_for(&admin),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    state.autosave.flush().await;
}

/// Edit then undo: each change is autosaved and undo ends disabled.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_edit_and_undo_autosave(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;
    let token = token_for(&owner);
    let state = common::test_state(pool.clone());
    let edit_uri = format!("/api/v1/tunes/{}/edit", tune.id);

    let response = get_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["abc"], SEED);
    assert_eq!(json["data"]["history_len"], 1);
    assert_eq!(json["data"]["can_undo"], false);

    let response = post_json_auth(
        common::build_app(state.clone()),
        &format!("{edit_uri}/changes"),
        serde_json::json!({ "abc": EDITED }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["history_len"], 2);
    assert_eq!(json["data"]["points"], 2);
    assert_eq!(json["data"]["can_undo"], true);

    state.autosave.flush().await;
    let stored = TuneRepo::find_by_id(&pool, tune.id).await.unwrap().unwrap();
    assert_eq!(stored.abc, EDITED);
    assert_eq!(stored.points, 2);

    let response = post_json_auth(
        common::build_app(state.clone()),
        &format!("{edit_uri}/undo"),
        serde_json::json!({}),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["abc"], SEED);
    assert_eq!(json["data"]["history_len"], 1);
    assert_eq!(json["data"]["can_undo"], false);

    state.autosave.flush().await;
    let stored = TuneRepo::find_by_id(&pool, tune.id).await.unwrap().unwrap();
    assert_eq!(stored.abc, SEED);
    assert_eq!(stored.points, 1);

    let response = get_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["autosave"]["state"], "saved");
}

/// Undo with only the seed left is a conflict and writes nothing.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_undo_disabled_returns_conflict(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;
    let token = token_for(&owner);
    let state = common::test_state(pool);
    let edit_uri = format!("/api/v1/tunes/{}/edit", tune.id);

    get_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    let response = post_json_auth(
        common::build_app(state.clone()),
        &format!("{edit_uri}/undo"),
        serde_json::json!({}),
        &token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    state.autosave.flush().await;
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_change_without_open_session(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/v1/tunes/{}/edit/changes", tune.id),
        serde_json::json!({ "abc": EDITED }),
        &token_for(&owner),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Closing discards the history; reopening starts from the stored body.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_close_editor_discards_history(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;
    let token = token_for(&owner);
    let state = common::test_state(pool);
    let edit_uri = format!("/api/v1/tunes/{}/edit", tune.id);

    get_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    post_json_auth(
        common::build_app(state.clone()),
        &format!("{edit_uri}/changes"),
        serde_json::json!({ "abc": EDITED }),
        &token,
    )
    .await;

    let response = delete_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = delete_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    state.autosave.flush().await;
    let response = get_auth(common::build_app(state.clone()), &edit_uri, &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["abc"], EDITED);
    assert_eq!(json["data"]["history_len"], 1);
    state.autosave.flush().await;
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// The title defaults to the `T:` field and the tune lands in the tunebook.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_create_tune(pool: PgPool) {
    let admin = create_test_user(&pool, "admin", ADMIN_ROLE_ID).await;
    let book = TunebookRepo::create(&pool, &CreateTunebook { name: "Etüden".into() })
        .await
        .unwrap();

    let body = serde_json::json!({
        "abc": "X:1\nT:Kadenz\nK:C\n\"T\"C \"D\"D",
        "difficulty": 2,
        "tunebook_id": book.id,
    });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/tunes",
        body,
        &token_for(&admin),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Kadenz");
    assert_eq!(json["data"]["points"], 2 + 2 * 2);
    assert_eq!(json["data"]["created_by"], admin.id);

    let books = TunebookRepo::list_with_tunes(&pool).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].tunes[0].title, "Kadenz");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_create_tune_unknown_tunebook(pool: PgPool) {
    let admin = create_test_user(&pool, "admin", ADMIN_ROLE_ID).await;

    let body = serde_json::json!({ "abc": SEED, "tunebook_id": 424242 });
    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/admin/tunes",
        body,
        &token_for(&admin),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

/// Delete accepts the `_id` alias and closes editor sessions on the tune.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_delete_tune(pool: PgPool) {
    let admin = create_test_user(&pool, "admin", ADMIN_ROLE_ID).await;
    let tune = create_test_tune(&pool, admin.id, SEED).await;
    let token = token_for(&admin);
    let state = common::test_state(pool.clone());

    get_auth(
        common::build_app(state.clone()),
        &format!("/api/v1/tunes/{}/edit", tune.id),
        &token,
    )
    .await;
    state.autosave.flush().await;
    assert_eq!(state.editors.len().await, 1);

    let body = serde_json::json!({ "_id": tune.id, "title": "ignored" });
    let response = delete_json_auth(
        common::build_app(state.clone()),
        "/api/v1/admin/tunes",
        body.clone(),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(TuneRepo::find_by_id(&pool, tune.id).await.unwrap().is_none());
    assert!(state.editors.is_empty().await);
    assert_eq!(state.autosave.status(tune.id).await, None);

    let response =
        delete_json_auth(common::build_app(state), "/api/v1/admin/tunes", body, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_requires_admin(pool: PgPool) {
    let owner = create_test_user(&pool, "owner", USER_ROLE_ID).await;
    let tune = create_test_tune(&pool, owner.id, SEED).await;

    let response = delete_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/tunes",
        serde_json::json!({ "id": tune.id }),
        &token_for(&owner),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(TuneRepo::find_by_id(&pool, tune.id).await.unwrap().is_some());
}
