//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the session identity from a JWT Bearer token.
//!   `Option<AuthUser>` yields `None` instead of rejecting.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.

pub mod auth;
pub mod rbac;
