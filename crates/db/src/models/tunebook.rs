//! Tunebook entity model and listing projections.

use harmolyze_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tunebooks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tunebook {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a tunebook.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTunebook {
    pub name: String,
}

/// Tune fields shown on a tunebook card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TuneSummary {
    pub id: DbId,
    pub title: String,
    pub difficulty: i16,
}

/// A tunebook together with its tunes, easiest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunebookWithTunes {
    pub id: DbId,
    pub name: String,
    pub tunes: Vec<TuneSummary>,
}

/// One joined row of the tunebook listing query.
#[derive(Debug, Clone, FromRow)]
pub struct TunebookTuneRow {
    pub tunebook_id: DbId,
    pub tunebook_name: String,
    pub tune_id: DbId,
    pub title: String,
    pub difficulty: i16,
}

/// Fold ordered listing rows into tunebooks.
///
/// Rows must arrive ordered by tunebook id; consecutive rows with the same
/// tunebook id are merged and keep their relative order.
pub fn group_rows(rows: Vec<TunebookTuneRow>) -> Vec<TunebookWithTunes> {
    let mut books: Vec<TunebookWithTunes> = Vec::new();
    for row in rows {
        let tune = TuneSummary {
            id: row.tune_id,
            title: row.title,
            difficulty: row.difficulty,
        };
        match books.last_mut() {
            Some(book) if book.id == row.tunebook_id => book.tunes.push(tune),
            _ => books.push(TunebookWithTunes {
                id: row.tunebook_id,
                name: row.tunebook_name,
                tunes: vec![tune],
            }),
        }
    }
    books
}
