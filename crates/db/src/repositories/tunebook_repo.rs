//! Repository for the `tunebooks` and `tunebook_tunes` tables.

use harmolyze_core::types::DbId;
use sqlx::PgPool;

use crate::models::tunebook::{
    group_rows, CreateTunebook, Tunebook, TunebookTuneRow, TunebookWithTunes,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides operations for tunebooks and their tune memberships.
pub struct TunebookRepo;

impl TunebookRepo {
    /// Insert a new tunebook, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateTunebook) -> Result<Tunebook, sqlx::Error> {
        let query = format!("INSERT INTO tunebooks (name) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Tunebook>(&query)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a tunebook by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Tunebook>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tunebooks WHERE id = $1");
        sqlx::query_as::<_, Tunebook>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Add a tune to a tunebook. Adding the same tune twice is a no-op.
    pub async fn add_tune(
        pool: &PgPool,
        tunebook_id: DbId,
        tune_id: DbId,
        position: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO tunebook_tunes (tunebook_id, tune_id, position)
             VALUES ($1, $2, $3)
             ON CONFLICT (tunebook_id, tune_id) DO NOTHING",
        )
        .bind(tunebook_id)
        .bind(tune_id)
        .bind(position)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// List tunebooks with their tunes.
    ///
    /// Tunebooks are ordered by id, tunes inside a tunebook by difficulty
    /// (easiest first). Tunebooks without tunes are omitted.
    pub async fn list_with_tunes(pool: &PgPool) -> Result<Vec<TunebookWithTunes>, sqlx::Error> {
        let rows = sqlx::query_as::<_, TunebookTuneRow>(
            "SELECT tb.id AS tunebook_id, tb.name AS tunebook_name,
                    t.id AS tune_id, t.title, t.difficulty
             FROM tunebooks tb
             JOIN tunebook_tunes tt ON tt.tunebook_id = tb.id
             JOIN tunes t ON t.id = tt.tune_id
             ORDER BY tb.id ASC, t.difficulty ASC, tt.position ASC, t.id ASC",
        )
        .fetch_all(pool)
        .await?;
        Ok(group_rows(rows))
    }
}
