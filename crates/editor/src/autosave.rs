//! Single-flight autosave queue.
//!
//! At most one write per tune is in flight. Updates submitted while a write
//! is running replace the queued update, so only the newest one is written
//! next. Writes for one tune are issued in submission order, which keeps the
//! persisted body monotonic. Failed writes, including a panicking sink, are
//! logged and recorded in the tune's [`AutosaveStatus`]; they are not retried.
//!
//! Every submission gets the next revision of its tune. Revisions are shared
//! by all writers of a tune, so a status always refers to the newest one.

use std::collections::HashMap;
use std::sync::Arc;

use harmolyze_core::types::DbId;
use serde::Serialize;
use tokio::sync::{oneshot, Mutex, Notify};

use crate::sink::{SinkError, TuneSink, TuneUpdate};

/// Outcome of the most recent autosave activity for a tune.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AutosaveStatus {
    /// A write for `revision` is queued or running.
    Pending { revision: u64 },
    /// `revision` was written successfully.
    Saved { revision: u64 },
    /// Writing `revision` failed.
    Failed { revision: u64, error: String },
}

type Waiter = oneshot::Sender<Result<(), SinkError>>;

/// An update plus everyone waiting for it, or for an update it replaced.
struct Queued {
    update: TuneUpdate,
    waiters: Vec<Waiter>,
}

#[derive(Default)]
struct Tunes {
    /// Tunes with a running writer task, mapped to the update queued behind it.
    writing: HashMap<DbId, Option<Queued>>,
    /// Last revision handed out per tune.
    revisions: HashMap<DbId, u64>,
    statuses: HashMap<DbId, AutosaveStatus>,
}

struct Shared {
    tunes: Mutex<Tunes>,
    idle: Notify,
}

/// Cheaply cloneable handle to the queue.
#[derive(Clone)]
pub struct AutosaveQueue {
    sink: Arc<dyn TuneSink>,
    shared: Arc<Shared>,
}

impl AutosaveQueue {
    pub fn new(sink: Arc<dyn TuneSink>) -> Self {
        Self {
            sink,
            shared: Arc::new(Shared {
                tunes: Mutex::new(Tunes::default()),
                idle: Notify::new(),
            }),
        }
    }

    /// Queue `update` for writing and return its revision immediately.
    ///
    /// `update.revision` is overwritten with the assigned revision.
    pub async fn submit(&self, update: TuneUpdate) -> u64 {
        let mut tunes = self.shared.tunes.lock().await;
        self.enqueue(&mut tunes, update, None)
    }

    /// Queue `update` only if nothing was submitted for its tune since
    /// revision `seen`.
    ///
    /// Used for bodies read from storage after [`flush_tune`](Self::flush_tune)
    /// returned `seen`: if another writer got in between, the read body is
    /// stale and is not written. Returns the assigned revision when queued.
    pub async fn submit_if_current(&self, update: TuneUpdate, seen: u64) -> Option<u64> {
        let mut tunes = self.shared.tunes.lock().await;
        let current = tunes.revisions.get(&update.tune_id).copied().unwrap_or(0);
        if current != seen {
            tracing::debug!(
                tune_id = update.tune_id,
                seen,
                current,
                "Stale autosave skipped"
            );
            return None;
        }
        Some(self.enqueue(&mut tunes, update, None))
    }

    /// Queue `update` and wait until it is written.
    ///
    /// If a newer update replaces it before its write starts, the outcome of
    /// the newer write is returned.
    pub async fn save(&self, update: TuneUpdate) -> Result<u64, SinkError> {
        let (tx, rx) = oneshot::channel();
        let revision = {
            let mut tunes = self.shared.tunes.lock().await;
            self.enqueue(&mut tunes, update, Some(tx))
        };
        rx.await
            .map_err(|_| SinkError::Storage("autosave writer stopped".into()))??;
        Ok(revision)
    }

    /// Latest autosave status for a tune, if anything was ever submitted.
    pub async fn status(&self, tune_id: DbId) -> Option<AutosaveStatus> {
        self.shared.tunes.lock().await.statuses.get(&tune_id).cloned()
    }

    /// Last revision handed out for a tune, 0 if none.
    pub async fn revision(&self, tune_id: DbId) -> u64 {
        self.shared
            .tunes
            .lock()
            .await
            .revisions
            .get(&tune_id)
            .copied()
            .unwrap_or(0)
    }

    /// Number of tunes with a write in flight.
    pub async fn in_flight(&self) -> usize {
        self.shared.tunes.lock().await.writing.len()
    }

    /// Drop all bookkeeping for a tune, e.g. after it was deleted.
    pub async fn forget(&self, tune_id: DbId) {
        let mut tunes = self.shared.tunes.lock().await;
        tunes.revisions.remove(&tune_id);
        tunes.statuses.remove(&tune_id);
    }

    /// Wait until no writes are in flight or queued.
    pub async fn flush(&self) {
        loop {
            let notified = self.shared.idle.notified();
            if self.shared.tunes.lock().await.writing.is_empty() {
                return;
            }
            notified.await;
        }
    }

    /// Wait until `tune_id` has no write in flight or queued.
    ///
    /// Returns the tune's revision at that moment; everything up to it has
    /// reached the sink.
    pub async fn flush_tune(&self, tune_id: DbId) -> u64 {
        loop {
            let notified = self.shared.idle.notified();
            {
                let tunes = self.shared.tunes.lock().await;
                if !tunes.writing.contains_key(&tune_id) {
                    return tunes.revisions.get(&tune_id).copied().unwrap_or(0);
                }
            }
            notified.await;
        }
    }

    fn enqueue(&self, tunes: &mut Tunes, mut update: TuneUpdate, waiter: Option<Waiter>) -> u64 {
        let tune_id = update.tune_id;
        let counter = tunes.revisions.entry(tune_id).or_insert(0);
        *counter += 1;
        let revision = *counter;
        update.revision = revision;
        tunes
            .statuses
            .insert(tune_id, AutosaveStatus::Pending { revision });

        let mut queued = Queued {
            update,
            waiters: waiter.into_iter().collect(),
        };
        match tunes.writing.get_mut(&tune_id) {
            Some(next) => {
                if let Some(replaced) = next.take() {
                    tracing::debug!(
                        tune_id,
                        replaced = replaced.update.revision,
                        revision,
                        "Autosave coalesced"
                    );
                    queued.waiters.extend(replaced.waiters);
                }
                *next = Some(queued);
            }
            None => {
                tunes.writing.insert(tune_id, None);
                let sink = Arc::clone(&self.sink);
                let shared = Arc::clone(&self.shared);
                tokio::spawn(run_writer(sink, shared, queued));
            }
        }
        revision
    }
}

/// Run one sink write in its own task so a panicking sink fails the write
/// instead of the writer loop.
async fn write(sink: &Arc<dyn TuneSink>, update: &TuneUpdate) -> Result<(), SinkError> {
    let sink = Arc::clone(sink);
    let update = update.clone();
    tokio::spawn(async move { sink.save(&update).await })
        .await
        .unwrap_or_else(|e| Err(SinkError::Storage(format!("autosave write aborted: {e}"))))
}

/// Write `first`, then keep writing whatever was queued meanwhile.
async fn run_writer(sink: Arc<dyn TuneSink>, shared: Arc<Shared>, first: Queued) {
    let tune_id = first.update.tune_id;
    let mut current = first;

    loop {
        let revision = current.update.revision;
        let result = write(&sink, &current.update).await;
        let status = match &result {
            Ok(()) => {
                tracing::debug!(
                    tune_id,
                    revision,
                    points = current.update.points,
                    "Autosave written"
                );
                AutosaveStatus::Saved { revision }
            }
            Err(e) => {
                tracing::warn!(tune_id, revision, error = %e, "Autosave failed");
                AutosaveStatus::Failed {
                    revision,
                    error: e.to_string(),
                }
            }
        };
        for waiter in current.waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }

        let mut tunes = shared.tunes.lock().await;
        // Forgotten tunes get no status back.
        let tracked = tunes.revisions.contains_key(&tune_id);
        match tunes.writing.get_mut(&tune_id).and_then(Option::take) {
            Some(next) => {
                // A newer update is queued; its Pending status stays visible.
                if tracked && matches!(status, AutosaveStatus::Failed { .. }) {
                    tunes.statuses.insert(tune_id, status);
                }
                drop(tunes);
                current = next;
            }
            None => {
                if tracked {
                    tunes.statuses.insert(tune_id, status);
                }
                tunes.writing.remove(&tune_id);
                drop(tunes);
                shared.idle.notify_waiters();
                return;
            }
        }
    }
}
