//! Repository for the `tunes` table.

use harmolyze_core::types::DbId;
use sqlx::PgPool;

use crate::models::tune::{CreateTune, Tune, UpdateTuneBody};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, abc, difficulty, points, created_by, created_at, updated_at";

/// Provides CRUD operations for tunes.
pub struct TuneRepo;

impl TuneRepo {
    /// Insert a new tune, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTune) -> Result<Tune, sqlx::Error> {
        let query = format!(
            "INSERT INTO tunes (title, abc, difficulty, points, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tune>(&query)
            .bind(&input.title)
            .bind(&input.abc)
            .bind(input.difficulty)
            .bind(input.points)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Find a tune by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tune>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tunes WHERE id = $1");
        sqlx::query_as::<_, Tune>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace the ABC body and points of a tune.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_body(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTuneBody,
    ) -> Result<Option<Tune>, sqlx::Error> {
        let query = format!(
            "UPDATE tunes SET abc = $2, points = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Tune>(&query)
            .bind(id)
            .bind(&input.abc)
            .bind(input.points)
            .fetch_optional(pool)
            .await
    }

    /// Hard-delete a tune. Tunebook memberships cascade.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tunes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
