//! HTTP client for the HarmoLyze API.
//!
//! [`ApiClient`] wraps the REST endpoints; [`HttpTuneSink`] plugs it into the
//! editor's autosave queue so a client-side editor persists through `PUT`.

pub mod api;
pub mod sink;

pub use api::{ApiClient, AuthSession, ClientError, SignupError, TuneSummary, Tunebook, UserInfo};
pub use sink::HttpTuneSink;
