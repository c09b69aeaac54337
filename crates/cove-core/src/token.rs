//! Vault key tokens.
//!
//! A vault key token is the caller-held capability for a vault. It is
//! generated once at vault creation, shown to the caller, and never stored
//! server-side in full: the salt segment exists only in the token, so a lost
//! token is unrecoverable by design — the server is zero-knowledge with
//! respect to the salt.
//!
//! Wire form: `projectKeyB64 "." saltB64 "." timestampB64`. Base64's
//! alphabet never contains `.`, so splitting is unambiguous.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::TokenError;
use crate::metadata::now_stamp;

/// Project key entropy in bytes (before base64).
const PROJECT_KEY_LEN: usize = 64;

/// Salt entropy in bytes (before base64).
const SALT_LEN: usize = 128;

/// A parsed or freshly generated vault key token.
///
/// `project_key` is both the storage lookup key and the KDF password;
/// `salt` is the KDF salt, held only by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultKeyToken {
    /// Base64 of 64 CSPRNG bytes. Storage lookup key and KDF password.
    pub project_key: String,
    /// Base64 of 128 CSPRNG bytes. Never persisted server-side.
    pub salt: String,
    /// Base64 of the creation time. Informational only.
    pub timestamp: String,
}

impl VaultKeyToken {
    /// Generate a fresh token from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut project_key = [0u8; PROJECT_KEY_LEN];
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut project_key);
        OsRng.fill_bytes(&mut salt);

        Self {
            project_key: BASE64.encode(project_key),
            salt: BASE64.encode(salt),
            timestamp: BASE64.encode(now_stamp()),
        }
    }

    /// Parse a token from its `.`-joined wire form.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Format`] unless the text splits into exactly
    /// three non-empty segments.
    pub fn parse(text: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = text.split('.').collect();
        match segments.as_slice() {
            [project_key, salt, timestamp]
                if !project_key.is_empty() && !salt.is_empty() && !timestamp.is_empty() =>
            {
                Ok(Self {
                    project_key: (*project_key).to_owned(),
                    salt: (*salt).to_owned(),
                    timestamp: (*timestamp).to_owned(),
                })
            }
            _ => Err(TokenError::Format {
                reason: format!(
                    "expected 3 non-empty '.'-separated segments, got {}",
                    segments.len()
                ),
            }),
        }
    }

    /// The `.`-joined wire form handed to the caller.
    #[must_use]
    pub fn full_key(&self) -> String {
        format!("{}.{}.{}", self.project_key, self.salt, self.timestamp)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generate_parse_roundtrip() {
        let token = VaultKeyToken::generate();
        let parsed = VaultKeyToken::parse(&token.full_key()).unwrap();
        assert_eq!(parsed.project_key, token.project_key);
        assert_eq!(parsed.salt, token.salt);
        assert_eq!(parsed.timestamp, token.timestamp);
    }

    #[test]
    fn generated_tokens_are_unique() {
        let a = VaultKeyToken::generate();
        let b = VaultKeyToken::generate();
        assert_ne!(a.project_key, b.project_key);
        assert_ne!(a.salt, b.salt);
    }

    #[test]
    fn segments_are_valid_base64_of_expected_length() {
        let token = VaultKeyToken::generate();
        let project_key = BASE64.decode(&token.project_key).unwrap();
        let salt = BASE64.decode(&token.salt).unwrap();
        assert_eq!(project_key.len(), 64);
        assert_eq!(salt.len(), 128);
        BASE64.decode(&token.timestamp).unwrap();
    }

    #[test]
    fn parse_rejects_wrong_segment_count() {
        assert!(VaultKeyToken::parse("only-one-segment").is_err());
        assert!(VaultKeyToken::parse("a.b").is_err());
        assert!(VaultKeyToken::parse("a.b.c.d").is_err());
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(VaultKeyToken::parse("a..c").is_err());
        assert!(VaultKeyToken::parse(".b.c").is_err());
        assert!(VaultKeyToken::parse("a.b.").is_err());
        assert!(VaultKeyToken::parse("..").is_err());
    }

    #[test]
    fn parse_accepts_plain_three_segments() {
        let token = VaultKeyToken::parse("a.b.c").unwrap();
        assert_eq!(token.project_key, "a");
        assert_eq!(token.salt, "b");
        assert_eq!(token.timestamp, "c");
    }
}
