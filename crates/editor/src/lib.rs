//! Exercise editing: edit history per session, derived points, and
//! autosave through a single-flight per-tune write queue.
//!
//! - [`sink`] -- the [`TuneSink`](sink::TuneSink) persistence seam.
//! - [`autosave`] -- [`AutosaveQueue`](autosave::AutosaveQueue).
//! - [`session`] -- [`EditorSession`](session::EditorSession).

pub mod autosave;
pub mod session;
pub mod sink;

pub use autosave::{AutosaveQueue, AutosaveStatus};
pub use session::{EditorSession, EditorSnapshot};
pub use sink::{SinkError, TuneSink, TuneUpdate};
