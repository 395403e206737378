//! Persistence seam for autosaved tune bodies.

use async_trait::async_trait;
use harmolyze_core::types::DbId;
use serde::Serialize;

/// The latest state of a tune to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TuneUpdate {
    #[serde(rename = "id")]
    pub tune_id: DbId,
    pub abc: String,
    pub points: u32,
    /// Per-tune revision, assigned by the queue on submit.
    #[serde(skip)]
    pub revision: u64,
}

/// Why a write did not reach storage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("tune {0} does not exist")]
    NotFound(DbId),

    #[error("storage rejected the write with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Somewhere tune bodies can be written to.
///
/// Implementations must be safe to call concurrently for different tunes;
/// [`AutosaveQueue`](crate::AutosaveQueue) never issues two concurrent
/// writes for the same tune.
#[async_trait]
pub trait TuneSink: Send + Sync + 'static {
    async fn save(&self, update: &TuneUpdate) -> Result<(), SinkError>;
}
