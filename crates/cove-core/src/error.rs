//! Error types for `cove-core`.
//!
//! A closed set of error kinds so callers can distinguish validation
//! failures from persistence failures. Crypto errors never include key
//! material, and authentication failures carry a fixed message — the caller
//! must not be able to tell a wrong salt from tampered ciphertext.

use cove_storage::StoreError;

/// Errors from vault key token parsing.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token text did not split into exactly three non-empty segments.
    #[error("malformed vault key token: {reason}")]
    Format { reason: String },
}

/// Errors from field encryption and decryption.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AES-256-GCM encryption failed.
    #[error("field encryption failed: {reason}")]
    Encryption { reason: String },

    /// AEAD verification failed — wrong key, wrong salt, or tampered data.
    /// Deliberately carries no detail that distinguishes the causes.
    #[error("field authentication failed")]
    Authentication,

    /// The encoded field did not have the `ciphertext.nonce.tag` shape.
    #[error("malformed encrypted field: {reason}")]
    FieldFormat { reason: String },
}

/// Errors from vault create, update, and decrypt operations.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The supplied vault key token was malformed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// No vault record exists for the project key.
    #[error("vault not found")]
    VaultNotFound,

    /// The named product does not exist in the vault.
    #[error("product not found: {name}")]
    ProductNotFound { name: String },

    /// The named secret does not exist in the product.
    #[error("secret not found: {name}")]
    SecretNotFound { name: String },

    /// The payload was not a well-formed product → secret mapping.
    #[error("malformed payload: {reason}")]
    PayloadFormat { reason: String },

    /// A cryptographic operation failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A vault record failed to serialize or deserialize.
    #[error("vault record serialization failed: {reason}")]
    Serialization { reason: String },

    /// The store failed. Surfaced immediately, never retried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
