//! Per-vault key derivation.
//!
//! The encryption key for a vault is derived from the `(project_key, salt)`
//! pair in the caller's token via PBKDF2-HMAC-SHA256. Derivation is pure and
//! deterministic, and the result is never cached: the engine derives at most
//! one key per operation and drops it when the operation completes, so a
//! derived key never outlives the request that needed it.
//!
//! The iteration count is a deliberate cost parameter — it bounds both
//! offline brute-force speed against a leaked record and per-request
//! latency. It is configurable but the default is fixed.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default PBKDF2 iteration count.
pub const DEFAULT_KDF_ITERATIONS: u32 = 500_000;

/// A 256-bit derived encryption key, zeroized on drop.
///
/// The inner bytes are never exposed in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; 32]);

impl DerivedKey {
    /// Borrow the raw key bytes.
    ///
    /// Use with care — the caller must not log or persist these bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a vault encryption key from the token's project key and salt.
///
/// PBKDF2-HMAC-SHA256 over the base64 text of both inputs, matching the
/// token wire form exactly — the same `(project_key, salt)` pair always
/// yields the same key, any other salt yields a key that fails AEAD
/// verification on existing fields.
#[must_use]
pub fn derive_key(project_key: &str, salt: &str, iterations: u32) -> DerivedKey {
    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(project_key.as_bytes(), salt.as_bytes(), iterations, &mut out);
    DerivedKey(out)
}
