//! Tune (exercise) entity model and DTOs.

use harmolyze_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tunes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tune {
    pub id: DbId,
    pub title: String,
    /// ABC-notation body.
    pub abc: String,
    /// Ordinal difficulty; tunebooks list easier tunes first.
    pub difficulty: i16,
    /// Derived score of `abc`.
    pub points: i32,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a tune. `points` is computed by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTune {
    pub title: String,
    pub abc: String,
    pub difficulty: i16,
    pub points: i32,
    pub created_by: DbId,
}

/// DTO for replacing the body of a tune after an edit.
#[derive(Debug, Clone)]
pub struct UpdateTuneBody {
    pub abc: String,
    pub points: i32,
}
