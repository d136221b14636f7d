//! Project API key generation and hashing.
//!
//! Keys look like `oe_<40 alphanumerics>`. Only the SHA-256 digest and the
//! first [`KEY_PREFIX_LENGTH`] characters are ever stored; the plaintext is
//! returned to the owner once, at creation or rotation.

use rand::Rng;

/// Scheme marker at the start of every project key.
pub const KEY_SCHEME: &str = "oe_";

/// Number of random alphanumeric characters after [`KEY_SCHEME`].
pub const KEY_RANDOM_LENGTH: usize = 40;

/// Total plaintext key length.
pub const KEY_LENGTH: usize = KEY_SCHEME.len() + KEY_RANDOM_LENGTH;

/// Number of leading characters stored as a human-visible prefix.
pub const KEY_PREFIX_LENGTH: usize = 8;

/// A freshly generated key.
pub struct GeneratedApiKey {
    /// Shown to the owner exactly once, never stored.
    pub plaintext: String,
    pub prefix: String,
    /// SHA-256 hex digest, the lookup column.
    pub hash: String,
}

impl std::fmt::Debug for GeneratedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedApiKey")
            .field("plaintext", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("hash", &self.hash)
            .finish()
    }
}

pub fn generate_api_key() -> GeneratedApiKey {
    let random: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(KEY_RANDOM_LENGTH)
        .map(char::from)
        .collect();
    let plaintext = format!("{KEY_SCHEME}{random}");

    GeneratedApiKey {
        prefix: extract_prefix(&plaintext).to_string(),
        hash: hash_api_key(&plaintext),
        plaintext,
    }
}

/// SHA-256 hex digest of a key, used both when storing and when looking up.
pub fn hash_api_key(key: &str) -> String {
    crate::hashing::sha256_hex(key.as_bytes())
}

/// First [`KEY_PREFIX_LENGTH`] characters, or the whole key if shorter.
pub fn extract_prefix(key: &str) -> &str {
    match key.char_indices().nth(KEY_PREFIX_LENGTH) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}

/// Cheap shape check before hitting the database.
pub fn looks_like_api_key(candidate: &str) -> bool {
    candidate
        .strip_prefix(KEY_SCHEME)
        .is_some_and(|rest| {
            rest.len() == KEY_RANDOM_LENGTH && rest.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_has_scheme_and_length() {
        let key = generate_api_key();
        assert!(key.plaintext.starts_with(KEY_SCHEME));
        assert_eq!(key.plaintext.len(), KEY_LENGTH);
        assert!(looks_like_api_key(&key.plaintext));
    }

    #[test]
    fn prefix_matches_start_of_plaintext() {
        let key = generate_api_key();
        assert_eq!(key.prefix.len(), KEY_PREFIX_LENGTH);
        assert!(key.plaintext.starts_with(&key.prefix));
    }

    #[test]
    fn stored_hash_matches_rehash() {
        let key = generate_api_key();
        assert_eq!(key.hash, hash_api_key(&key.plaintext));
        assert_eq!(key.hash.len(), 64);
    }

    #[test]
    fn keys_are_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn extract_prefix_handles_short_and_multibyte_input() {
        assert_eq!(extract_prefix("abc"), "abc");
        assert_eq!(extract_prefix("oe_abcdefghij"), "oe_abcde");
        assert_eq!(extract_prefix("ééééééééé"), "éééééééé");
    }

    #[test]
    fn shape_check_rejects_malformed_keys() {
        assert!(!looks_like_api_key(""));
        assert!(!looks_like_api_key("oe_short"));
        assert!(!looks_like_api_key(&format!("xx_{}", "a".repeat(KEY_RANDOM_LENGTH))));
        assert!(!looks_like_api_key(&format!("oe_{}-", "a".repeat(KEY_RANDOM_LENGTH - 1))));
        assert!(looks_like_api_key(&format!("oe_{}", "a".repeat(KEY_RANDOM_LENGTH))));
    }

    #[test]
    fn debug_output_hides_plaintext() {
        let key = generate_api_key();
        let debug = format!("{key:?}");
        assert!(!debug.contains(&key.plaintext));
        assert!(debug.contains("<redacted>"));
    }
}
