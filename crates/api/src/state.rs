use std::sync::Arc;

use harmolyze_editor::AutosaveQueue;

use crate::config::ServerConfig;
use crate::editor::EditorRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: harmolyze_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Single-flight autosave queue writing editor snapshots to the database.
    pub autosave: AutosaveQueue,
    /// Open editing sessions keyed by user and tune.
    pub editors: Arc<EditorRegistry>,
}

impl AppState {
    /// Build state with a database-backed autosave queue.
    pub fn new(pool: harmolyze_db::DbPool, config: ServerConfig) -> Self {
        let sink = Arc::new(crate::autosave::PgTuneSink::new(pool.clone()));
        Self {
            pool,
            config: Arc::new(config),
            autosave: AutosaveQueue::new(sink),
            editors: Arc::new(EditorRegistry::new()),
        }
    }
}
