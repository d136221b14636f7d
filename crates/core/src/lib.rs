//! Domain logic for the OpenErr error-monitoring service.
//!
//! Everything here is pure and synchronous: record parsing, the insights
//! aggregator, severity classification, API key and one-time-code material,
//! and input validation. I/O lives in `openerr-db` and `openerr-api`.

pub mod api_keys;
pub mod error;
pub mod hashing;
pub mod insights;
pub mod log_record;
pub mod otp;
pub mod severity;
pub mod source_errors;
pub mod types;
pub mod validation;
