//! Database-backed [`TuneSink`] used by the in-process autosave queue.

use async_trait::async_trait;
use harmolyze_db::models::tune::UpdateTuneBody;
use harmolyze_db::repositories::TuneRepo;
use harmolyze_db::DbPool;
use harmolyze_editor::{SinkError, TuneSink, TuneUpdate};

/// Writes autosaved bodies straight into the `tunes` table.
pub struct PgTuneSink {
    pool: DbPool,
}

impl PgTuneSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TuneSink for PgTuneSink {
    async fn save(&self, update: &TuneUpdate) -> Result<(), SinkError> {
        let points = i32::try_from(update.points)
            .map_err(|_| SinkError::Storage(format!("points out of range: {}", update.points)))?;
        let body = UpdateTuneBody {
            abc: update.abc.clone(),
            points,
        };

        match TuneRepo::update_body(&self.pool, update.tune_id, &body).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(SinkError::NotFound(update.tune_id)),
            Err(e) => Err(SinkError::Storage(e.to_string())),
        }
    }
}
