//! Request extractors.
//!
//! - [`auth::AuthUser`]: a dashboard user, from a JWT.
//! - [`api_key::ProjectKey`]: a project, from its ingest API key.

pub mod api_key;
pub mod auth;
