//! HarmoLyze API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! editor sessions) so integration tests and the binary entrypoint can both
//! access them.

pub mod auth;
pub mod autosave;
pub mod config;
pub mod editor;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
