//! OpenErr API server library.
//!
//! Exposes config, state, error handling, extractors, handlers and routes so
//! the binary and the integration tests build the same application.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod mail;
pub mod middleware;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
