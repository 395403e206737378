//! One user's editing session on one tune.

use std::convert::Infallible;
use std::future::Future;

use harmolyze_core::history::EditHistory;
use harmolyze_core::scoring::calculate_points;
use harmolyze_core::types::DbId;
use serde::Serialize;

use crate::autosave::AutosaveQueue;
use crate::sink::TuneUpdate;

/// View of a session after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorSnapshot {
    pub tune_id: DbId,
    pub abc: String,
    pub points: u32,
    pub history_len: usize,
    pub can_undo: bool,
    pub revision: u64,
}

/// Edit history of a tune plus autosave of its newest snapshot.
///
/// Every change of the newest snapshot (open, edit, undo) submits
/// `{id, abc, points}` to the [`AutosaveQueue`]. `revision` is the queue
/// revision of the last submission made by this session.
pub struct EditorSession {
    tune_id: DbId,
    history: EditHistory,
    revision: u64,
    autosave: AutosaveQueue,
}

impl EditorSession {
    /// Start a session seeded with the body returned by `read_seed`.
    ///
    /// Pending writes for the tune are drained before `read_seed` runs, so it sees
    /// the newest persisted body. The seed is then submitted once so stored
    /// points follow the current scoring, unless another writer submitted for
    /// the tune in the meantime.
    pub async fn load<F, Fut, E>(
        tune_id: DbId,
        autosave: AutosaveQueue,
        read_seed: F,
    ) -> Result<Self, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let seen = autosave.flush_tune(tune_id).await;
        let seed = read_seed().await?;
        let mut session = Self {
            tune_id,
            history: EditHistory::new(seed),
            revision: seen,
            autosave,
        };
        let seeded = session
            .autosave
            .submit_if_current(session.latest_update(), seen)
            .await;
        if let Some(revision) = seeded {
            session.revision = revision;
        }
        Ok(session)
    }

    /// Start a session seeded with an already known body.
    pub async fn open(tune_id: DbId, seed: impl Into<String>, autosave: AutosaveQueue) -> Self {
        let seed = seed.into();
        match Self::load(tune_id, autosave, move || async move { Ok::<_, Infallible>(seed) }).await {
            Ok(session) => session,
            Err(never) => match never {},
        }
    }

    /// Record an edit and autosave it.
    pub async fn edit(&mut self, abc: impl Into<String>) -> EditorSnapshot {
        self.history.append(abc);
        self.persist_latest().await;
        self.snapshot()
    }

    /// Revert the newest edit and autosave the restored snapshot.
    ///
    /// Returns `None`, without autosaving, when only the seed remains.
    pub async fn undo(&mut self) -> Option<EditorSnapshot> {
        self.history.undo()?;
        self.persist_latest().await;
        Some(self.snapshot())
    }

    pub fn tune_id(&self) -> DbId {
        self.tune_id
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        let abc = self.history.latest().to_string();
        EditorSnapshot {
            tune_id: self.tune_id,
            points: calculate_points(&abc),
            abc,
            history_len: self.history.len(),
            can_undo: self.history.can_undo(),
            revision: self.revision,
        }
    }

    fn latest_update(&self) -> TuneUpdate {
        let abc = self.history.latest().to_string();
        TuneUpdate {
            tune_id: self.tune_id,
            points: calculate_points(&abc),
            abc,
            revision: 0,
        }
    }

    async fn persist_latest(&mut self) {
        self.revision = self.autosave.submit(self.latest_update()).await;
    }
}
