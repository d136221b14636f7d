//! One-time login codes.
//!
//! A code is six decimal digits. The server keeps only its SHA-256 digest and
//! an expiry; the plaintext goes out by email and nowhere else.

use chrono::Duration;
use rand::Rng;

use crate::error::CoreError;
use crate::types::Timestamp;

pub const OTP_LENGTH: usize = 6;

/// Default lifetime of a code, in minutes.
pub const DEFAULT_OTP_EXPIRY_MINS: i64 = 5;

pub const OTP_EMAIL_SUBJECT: &str = "Your OTP for Login";

/// A freshly issued code.
pub struct IssuedOtp {
    pub code: String,
    pub hash: String,
    pub expires_at: Timestamp,
}

pub fn issue_otp(now: Timestamp, expiry_mins: i64) -> IssuedOtp {
    let code = rand::rng().random_range(100_000..1_000_000u32).to_string();
    IssuedOtp {
        hash: hash_otp(&code),
        code,
        expires_at: now + Duration::minutes(expiry_mins),
    }
}

pub fn hash_otp(code: &str) -> String {
    crate::hashing::sha256_hex(code.as_bytes())
}

/// Outcome of checking a submitted code against the stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpCheck {
    Valid,
    /// No code on record (never sent, or already used).
    Missing,
    Expired,
    Mismatch,
}

impl OtpCheck {
    /// Message returned to the client for a failed check.
    pub fn message(self) -> &'static str {
        match self {
            Self::Valid => "OTP verified",
            Self::Missing => "OTP not found or expired",
            Self::Expired => "OTP has expired",
            Self::Mismatch => "Invalid OTP",
        }
    }
}

/// Check order: presence, then expiry, then the code itself.
pub fn check_otp(
    stored_hash: Option<&str>,
    expires_at: Option<Timestamp>,
    submitted: &str,
    now: Timestamp,
) -> OtpCheck {
    let (Some(stored_hash), Some(expires_at)) = (stored_hash, expires_at) else {
        return OtpCheck::Missing;
    };
    if now > expires_at {
        return OtpCheck::Expired;
    }
    if validate_otp_format(submitted).is_err() || hash_otp(submitted.trim()) != stored_hash {
        return OtpCheck::Mismatch;
    }
    OtpCheck::Valid
}

pub fn validate_otp_format(code: &str) -> Result<(), CoreError> {
    let code = code.trim();
    if code.len() != OTP_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "OTP must be {OTP_LENGTH} digits"
        )));
    }
    Ok(())
}

pub fn otp_email_body(code: &str, expiry_mins: i64) -> String {
    format!("Your OTP is: {code}. This OTP will expire in {expiry_mins} minutes.")
}
