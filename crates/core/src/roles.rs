//! Well-known role name constants.
//!
//! These must match the seed data in `20260301000001_create_roles_and_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Role id assigned to accounts created through signup.
pub const DEFAULT_ROLE_ID: i64 = 2;

/// Returns `true` if `role` grants administrator rights.
pub fn is_admin(role: &str) -> bool {
    role == ROLE_ADMIN
}
