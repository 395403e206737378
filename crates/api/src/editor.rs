//! Registry of open editing sessions.
//!
//! A session belongs to one user and one tune. Opening the editor resumes an
//! existing session; otherwise a fresh history is seeded with the stored body
//! once pending autosaves of the tune were written.
//! Closing the session discards its history.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use harmolyze_core::types::DbId;
use harmolyze_editor::{AutosaveQueue, EditorSession};
use tokio::sync::{Mutex, RwLock};

pub type SharedSession = Arc<Mutex<EditorSession>>;

type SessionKey = (DbId, DbId);

#[derive(Default)]
pub struct EditorRegistry {
    sessions: RwLock<HashMap<SessionKey, SharedSession>>,
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume the session of `user_id` on `tune_id`, or start one seeded
    /// with the body returned by `read_seed`.
    ///
    /// `read_seed` only runs when a new session is started, after pending
    /// autosaves of the tune were written.
    pub async fn open_or_resume<F, Fut, E>(
        &self,
        user_id: DbId,
        tune_id: DbId,
        autosave: AutosaveQueue,
        read_seed: F,
    ) -> Result<SharedSession, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let Some(existing) = self.get(user_id, tune_id).await {
            tracing::debug!(user_id, tune_id, "Editor session resumed");
            return Ok(existing);
        }

        let loaded = EditorSession::load(tune_id, autosave, read_seed).await?;
        let mut sessions = self.sessions.write().await;
        // A concurrent open of the same session wins.
        let session = sessions
            .entry((user_id, tune_id))
            .or_insert_with(|| Arc::new(Mutex::new(loaded)));
        tracing::debug!(user_id, tune_id, "Editor session opened");
        Ok(Arc::clone(session))
    }

    pub async fn get(&self, user_id: DbId, tune_id: DbId) -> Option<SharedSession> {
        self.sessions.read().await.get(&(user_id, tune_id)).cloned()
    }

    /// Drop one session. Returns `true` if it existed.
    pub async fn close(&self, user_id: DbId, tune_id: DbId) -> bool {
        self.sessions
            .write()
            .await
            .remove(&(user_id, tune_id))
            .is_some()
    }

    /// Drop every session on `tune_id`, e.g. after the tune was deleted.
    pub async fn close_tune(&self, tune_id: DbId) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|(_, tune), _| *tune != tune_id);
        before - sessions.len()
    }

    /// Drop every session of `user_id`, e.g. on logout.
    pub async fn close_user(&self, user_id: DbId) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|(user, _), _| *user != user_id);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use async_trait::async_trait;
    use harmolyze_editor::{SinkError, TuneSink, TuneUpdate};

    use super::*;

    struct NullSink;

    #[async_trait]
    impl TuneSink for NullSink {
        async fn save(&self, _update: &TuneUpdate) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn queue() -> AutosaveQueue {
        AutosaveQueue::new(Arc::new(NullSink))
    }

    async fn seed() -> Result<String, Infallible> {
        Ok("K:C\nC".to_string())
    }

    async fn open(
        registry: &EditorRegistry,
        user_id: DbId,
        tune_id: DbId,
        queue: &AutosaveQueue,
    ) -> SharedSession {
        match registry
            .open_or_resume(user_id, tune_id, queue.clone(), seed)
            .await
        {
            Ok(session) => session,
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn reopening_resumes_history() {
        let registry = EditorRegistry::new();
        let queue = queue();

        let first = open(&registry, 1, 10, &queue).await;
        first.lock().await.edit("K:C\nCC").await;

        let resumed = registry
            .open_or_resume(1, 10, queue.clone(), || async {
                Err::<String, &str>("seed not needed")
            })
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &resumed));
        assert_eq!(resumed.lock().await.snapshot().history_len, 2);
        assert_eq!(registry.len().await, 1);
        queue.flush().await;
    }

    #[tokio::test]
    async fn closing_discards_history() {
        let registry = EditorRegistry::new();
        let queue = queue();

        let first = open(&registry, 1, 10, &queue).await;
        first.lock().await.edit("K:C\nCC").await;
        assert!(registry.close(1, 10).await);
        assert!(!registry.close(1, 10).await);

        let fresh = open(&registry, 1, 10, &queue).await;
        assert_eq!(fresh.lock().await.snapshot().history_len, 1);
        queue.flush().await;
    }

    #[tokio::test]
    async fn sessions_are_per_user() {
        let registry = EditorRegistry::new();
        let queue = queue();

        open(&registry, 1, 10, &queue).await;
        open(&registry, 2, 10, &queue).await;
        open(&registry, 2, 11, &queue).await;
        assert_eq!(registry.len().await, 3);
        assert!(registry.get(1, 11).await.is_none());

        assert_eq!(registry.close_tune(10).await, 2);
        assert_eq!(registry.close_user(2).await, 1);
        assert!(registry.is_empty().await);
        queue.flush().await;
    }
}
