//! Authentication primitives.
//!
//! - [`password`]: Argon2id hashing and verification.
//! - [`jwt`]: signed tokens recording how the user signed in.
//! - [`cookie`]: the `auth_token` cookie carrying the access token.

pub mod cookie;
pub mod jwt;
pub mod password;
