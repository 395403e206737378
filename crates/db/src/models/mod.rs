//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - Update DTOs where the entity is mutable

pub mod role;
pub mod session;
pub mod tune;
pub mod tunebook;
pub mod user;
