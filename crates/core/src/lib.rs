//! Domain logic for HarmoLyze: ABC scanning, exercise scoring, edit history,
//! signup rules and access checks. No I/O lives here.

pub mod abc;
pub mod access;
pub mod error;
pub mod history;
pub mod roles;
pub mod scoring;
pub mod signup;
pub mod types;
