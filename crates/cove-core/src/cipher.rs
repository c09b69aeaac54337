//! Per-field authenticated encryption.
//!
//! Every secret value is encrypted on its own with AES-256-GCM under the
//! vault's derived key, with a fresh 96-bit CSPRNG nonce per call. The
//! stored form keeps ciphertext, nonce, and tag as separate base64 segments
//! joined with `.` — any single-bit change to any segment makes decryption
//! fail, and a failed verification never yields plaintext.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;
use crate::kdf::DerivedKey;

/// Nonce length for AES-256-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
const TAG_LEN: usize = 16;

/// One encrypted secret value: ciphertext, nonce, and authentication tag.
///
/// Serializes as the wire string `ciphertextB64 "." nonceB64 "." tagB64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    ciphertext: Vec<u8>,
    nonce: [u8; NONCE_LEN],
    tag: [u8; TAG_LEN],
}

impl EncryptedField {
    /// Encode as the `.`-joined base64 wire form.
    #[must_use]
    pub fn encode(&self) -> String {
        format!(
            "{}.{}.{}",
            BASE64.encode(&self.ciphertext),
            BASE64.encode(self.nonce),
            BASE64.encode(self.tag)
        )
    }

    /// Decode from the `.`-joined base64 wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::FieldFormat`] unless the text splits into
    /// exactly three base64 segments with a 12-byte nonce and 16-byte tag.
    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let segments: Vec<&str> = text.split('.').collect();
        let [ciphertext_b64, nonce_b64, tag_b64] = segments.as_slice() else {
            return Err(CryptoError::FieldFormat {
                reason: format!(
                    "expected 3 '.'-separated segments, got {}",
                    segments.len()
                ),
            });
        };

        let ciphertext = BASE64
            .decode(ciphertext_b64)
            .map_err(|e| CryptoError::FieldFormat {
                reason: format!("ciphertext segment: {e}"),
            })?;
        let nonce: [u8; NONCE_LEN] = BASE64
            .decode(nonce_b64)
            .map_err(|e| CryptoError::FieldFormat {
                reason: format!("nonce segment: {e}"),
            })?
            .try_into()
            .map_err(|_| CryptoError::FieldFormat {
                reason: format!("nonce must be {NONCE_LEN} bytes"),
            })?;
        let tag: [u8; TAG_LEN] = BASE64
            .decode(tag_b64)
            .map_err(|e| CryptoError::FieldFormat {
                reason: format!("tag segment: {e}"),
            })?
            .try_into()
            .map_err(|_| CryptoError::FieldFormat {
                reason: format!("tag must be {TAG_LEN} bytes"),
            })?;

        Ok(Self {
            ciphertext,
            nonce,
            tag,
        })
    }
}

impl Serialize for EncryptedField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for EncryptedField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::decode(&text).map_err(D::Error::custom)
    }
}

/// Encrypt one secret value with a fresh random nonce.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if the AEAD operation fails.
pub fn encrypt_field(plaintext: &str, key: &DerivedKey) -> Result<EncryptedField, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    // aes-gcm appends the tag to the ciphertext; the wire format keeps them
    // as separate segments.
    let mut combined = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encryption {
            reason: e.to_string(),
        })?;
    let tag_start = combined.len() - TAG_LEN;
    let tag_bytes = combined.split_off(tag_start);
    let tag: [u8; TAG_LEN] = tag_bytes
        .try_into()
        .map_err(|_| CryptoError::Encryption {
            reason: "unexpected tag length".to_owned(),
        })?;

    let mut nonce_out = [0u8; NONCE_LEN];
    nonce_out.copy_from_slice(&nonce);

    Ok(EncryptedField {
        ciphertext: combined,
        nonce: nonce_out,
        tag,
    })
}

/// Verify and decrypt one secret value.
///
/// # Errors
///
/// Returns [`CryptoError::Authentication`] if AEAD verification fails for
/// any reason — wrong key, wrong salt, or tampered data all produce the same
/// error, and no unverified plaintext is ever returned.
pub fn decrypt_field(field: &EncryptedField, key: &DerivedKey) -> Result<String, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let nonce = Nonce::from_slice(&field.nonce);

    let mut combined = Vec::with_capacity(field.ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(&field.ciphertext);
    combined.extend_from_slice(&field.tag);

    let plaintext = cipher
        .decrypt(nonce, combined.as_slice())
        .map_err(|_| CryptoError::Authentication)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::FieldFormat {
        reason: "plaintext is not valid UTF-8".to_owned(),
    })
}
