//! Row structs and DTOs.
//!
//! Each submodule holds a `FromRow` entity matching the table, a safe
//! response shape where the row carries secrets, and create/update DTOs.

pub mod project;
pub mod user;
