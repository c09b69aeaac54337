//! The vault engine: create, merge-update, and decrypt.
//!
//! Orchestrates the token codec, key derivation, field cipher, and metadata
//! bookkeeping over an injected [`VaultStore`]. Each operation is
//! independent — at most one store read plus one store write, no lock and no
//! transaction between them, so concurrent updates to the same project key
//! are last-write-wins. Store failures surface immediately; nothing is
//! retried and no partial write is ever reported as success.
//!
//! The derived key is computed lazily at most once per operation and dropped
//! (zeroized) when the operation returns.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use cove_storage::VaultStore;

use crate::cipher::{decrypt_field, encrypt_field};
use crate::error::VaultError;
use crate::kdf::{derive_key, DerivedKey, DEFAULT_KDF_ITERATIONS};
use crate::metadata::Metadata;
use crate::record::{ProductSecrets, VaultRecord, METADATA_PRODUCT};
use crate::token::VaultKeyToken;

/// One product's worth of payload: secret name → value. `None` or an empty
/// string means delete.
pub type SecretPayload = BTreeMap<String, Option<String>>;

/// A partial update payload: product name → secrets.
pub type VaultPayload = BTreeMap<String, SecretPayload>;

/// Parse a JSON request body into a payload.
///
/// # Errors
///
/// Returns [`VaultError::PayloadFormat`] unless the body is a JSON object of
/// objects whose values are strings or null.
pub fn parse_payload(body: &[u8]) -> Result<VaultPayload, VaultError> {
    serde_json::from_slice(body).map_err(|e| VaultError::PayloadFormat {
        reason: e.to_string(),
    })
}

/// A decrypted view of a vault (or one product of it), plus the metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DecryptedVault {
    /// The vault's bookkeeping and extra keys.
    pub vault_metadata: Metadata,
    /// Product name → secret name → plaintext value.
    pub data: BTreeMap<String, BTreeMap<String, String>>,
}

/// A single decrypted secret, plus the metadata.
#[derive(Debug, Clone, Serialize)]
pub struct DecryptedSecret {
    /// The vault's bookkeeping and extra keys.
    pub vault_metadata: Metadata,
    /// The plaintext value.
    pub data: String,
}

/// Derives the vault key on first use, at most once per operation.
struct LazyKey<'a> {
    token: &'a VaultKeyToken,
    iterations: u32,
    key: Option<DerivedKey>,
}

impl<'a> LazyKey<'a> {
    fn new(token: &'a VaultKeyToken, iterations: u32) -> Self {
        Self {
            token,
            iterations,
            key: None,
        }
    }

    fn get(&mut self) -> &DerivedKey {
        self.key.get_or_insert_with(|| {
            derive_key(&self.token.project_key, &self.token.salt, self.iterations)
        })
    }
}

/// The vault mutation and decryption engine.
pub struct VaultEngine {
    store: Arc<dyn VaultStore>,
    kdf_iterations: u32,
}

impl std::fmt::Debug for VaultEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultEngine")
            .field("kdf_iterations", &self.kdf_iterations)
            .finish_non_exhaustive()
    }
}

impl VaultEngine {
    /// Create an engine over the given store with the default KDF cost.
    #[must_use]
    pub fn new(store: Arc<dyn VaultStore>) -> Self {
        Self {
            store,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
        }
    }

    /// Override the PBKDF2 iteration count.
    ///
    /// Lowering this weakens every vault created or read through this
    /// engine; it exists for deployments that must trade brute-force margin
    /// against request latency (and for tests).
    #[must_use]
    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    /// Create a new vault, returning its key token and the stored record.
    ///
    /// With no payload the vault starts empty, holding only its metadata.
    /// Otherwise each non-empty secret value is encrypted and stored; empty
    /// and null values are never stored, even on create. Values under the
    /// reserved `vault_metadata` product are stored plaintext as extra
    /// metadata keys.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Crypto`] if encryption fails, or
    /// [`VaultError::Store`] if the insert fails.
    pub async fn create_vault(
        &self,
        payload: Option<VaultPayload>,
    ) -> Result<(VaultKeyToken, VaultRecord), VaultError> {
        let token = VaultKeyToken::generate();
        let mut record = VaultRecord::default();
        let mut key = LazyKey::new(&token, self.kdf_iterations);

        if let Some(payload) = payload {
            for (product, secrets) in payload {
                if product != METADATA_PRODUCT {
                    record.products.entry(product.clone()).or_default();
                }
                for (name, value) in secrets {
                    let Some(value) = value else { continue };
                    if value.is_empty() {
                        continue;
                    }
                    if product == METADATA_PRODUCT {
                        record.metadata.set_extra(&name, value);
                    } else {
                        let field = encrypt_field(&value, key.get())?;
                        record
                            .products
                            .entry(product.clone())
                            .or_default()
                            .insert(name, field);
                    }
                }
            }
        }

        record.metadata.touch();
        let stored = to_stored(&record)?;
        self.store.create(&token.project_key, &stored).await?;

        info!(
            products = record.products.len(),
            version = record.metadata.version,
            "vault created"
        );
        Ok((token, record))
    }

    /// Apply a partial update to an existing vault.
    ///
    /// Per `(product, secret, value)` triple: a non-empty value is encrypted
    /// and set (creating the product if absent); an empty or null value
    /// deletes the secret if present — deleting from a product that does not
    /// exist is a no-op. Writes and deletes against the reserved metadata
    /// bookkeeping names are silently ignored. Metadata is touched
    /// unconditionally, so even an empty payload advances `version` and
    /// refreshes `updated`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Token`] for a malformed token,
    /// [`VaultError::VaultNotFound`] if no record exists for the project
    /// key, [`VaultError::Crypto`] if encryption fails, or
    /// [`VaultError::Store`] if persistence fails.
    pub async fn update_vault(
        &self,
        token_text: &str,
        payload: VaultPayload,
    ) -> Result<VaultRecord, VaultError> {
        let token = VaultKeyToken::parse(token_text)?;
        let mut record = self.load(&token.project_key).await?;
        let mut key = LazyKey::new(&token, self.kdf_iterations);

        for (product, secrets) in payload {
            for (name, value) in secrets {
                match value {
                    Some(value) if !value.is_empty() => {
                        if product == METADATA_PRODUCT {
                            record.metadata.set_extra(&name, value);
                        } else {
                            let field = encrypt_field(&value, key.get())?;
                            record
                                .products
                                .entry(product.clone())
                                .or_default()
                                .insert(name, field);
                        }
                    }
                    _ => {
                        if product == METADATA_PRODUCT {
                            record.metadata.remove_extra(&name);
                        } else if let Some(existing) = record.products.get_mut(&product) {
                            existing.remove(&name);
                        }
                    }
                }
            }
        }

        record.metadata.touch();
        let stored = to_stored(&record)?;
        self.store.save(&token.project_key, &stored).await?;

        info!(version = record.metadata.version, "vault updated");
        Ok(record)
    }

    /// Decrypt a vault — every product, or a single one when named.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Token`], [`VaultError::VaultNotFound`],
    /// [`VaultError::ProductNotFound`] if a named product is absent, or
    /// [`VaultError::Crypto`] with an opaque authentication failure when the
    /// token's salt does not match the one the fields were encrypted with.
    pub async fn decrypt_vault(
        &self,
        token_text: &str,
        product: Option<&str>,
    ) -> Result<DecryptedVault, VaultError> {
        let token = VaultKeyToken::parse(token_text)?;
        let record = self.load(&token.project_key).await?;
        let key = derive_key(&token.project_key, &token.salt, self.kdf_iterations);

        let mut data = BTreeMap::new();
        match product {
            Some(name) => {
                let secrets =
                    record
                        .products
                        .get(name)
                        .ok_or_else(|| VaultError::ProductNotFound {
                            name: name.to_owned(),
                        })?;
                data.insert(name.to_owned(), decrypt_product(secrets, &key)?);
            }
            None => {
                for (name, secrets) in &record.products {
                    data.insert(name.clone(), decrypt_product(secrets, &key)?);
                }
            }
        }

        Ok(DecryptedVault {
            vault_metadata: record.metadata,
            data,
        })
    }

    /// Decrypt a single secret.
    ///
    /// # Errors
    ///
    /// As [`decrypt_vault`](Self::decrypt_vault), plus
    /// [`VaultError::SecretNotFound`] if the product exists but the secret
    /// does not.
    pub async fn decrypt_secret(
        &self,
        token_text: &str,
        product: &str,
        secret: &str,
    ) -> Result<DecryptedSecret, VaultError> {
        let token = VaultKeyToken::parse(token_text)?;
        let record = self.load(&token.project_key).await?;

        let secrets = record
            .products
            .get(product)
            .ok_or_else(|| VaultError::ProductNotFound {
                name: product.to_owned(),
            })?;
        let field = secrets.get(secret).ok_or_else(|| VaultError::SecretNotFound {
            name: secret.to_owned(),
        })?;

        let key = derive_key(&token.project_key, &token.salt, self.kdf_iterations);
        let data = decrypt_field(field, &key)?;

        Ok(DecryptedSecret {
            vault_metadata: record.metadata,
            data,
        })
    }

    async fn load(&self, project_key: &str) -> Result<VaultRecord, VaultError> {
        let stored = self
            .store
            .get(project_key)
            .await?
            .ok_or(VaultError::VaultNotFound)?;
        from_stored(stored)
    }
}

fn decrypt_product(
    secrets: &ProductSecrets,
    key: &DerivedKey,
) -> Result<BTreeMap<String, String>, VaultError> {
    secrets
        .iter()
        .map(|(name, field)| Ok((name.clone(), decrypt_field(field, key)?)))
        .collect()
}

fn to_stored(record: &VaultRecord) -> Result<serde_json::Value, VaultError> {
    serde_json::to_value(record).map_err(|e| VaultError::Serialization {
        reason: e.to_string(),
    })
}

fn from_stored(value: serde_json::Value) -> Result<VaultRecord, VaultError> {
    serde_json::from_value(value).map_err(|e| VaultError::Serialization {
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_payload_accepts_nested_map() {
        let payload = parse_payload(br#"{"app": {"db_password": "pw", "old": null}}"#).unwrap();
        assert_eq!(payload["app"]["db_password"], Some("pw".to_owned()));
        assert_eq!(payload["app"]["old"], None);
    }

    #[test]
    fn parse_payload_accepts_empty_object() {
        let payload = parse_payload(b"{}").unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn parse_payload_rejects_non_object() {
        assert!(matches!(
            parse_payload(b"[1, 2]"),
            Err(VaultError::PayloadFormat { .. })
        ));
        assert!(matches!(
            parse_payload(b"not json"),
            Err(VaultError::PayloadFormat { .. })
        ));
    }

    #[test]
    fn parse_payload_rejects_non_string_values() {
        assert!(matches!(
            parse_payload(br#"{"app": {"count": 3}}"#),
            Err(VaultError::PayloadFormat { .. })
        ));
        assert!(matches!(
            parse_payload(br#"{"app": "flat"}"#),
            Err(VaultError::PayloadFormat { .. })
        ));
    }
}
