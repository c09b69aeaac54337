//! The vault record.
//!
//! A vault is a mapping from product name to a map of named encrypted
//! secrets, plus the server-maintained metadata. The metadata is a typed
//! field here rather than a magic product name, so the merge logic cannot
//! accidentally encrypt it or let a client overwrite the bookkeeping — the
//! reserved name only exists at the serialization boundary.
//!
//! Persisted layout (one JSON object per project key):
//!
//! ```json
//! {
//!   "vault_metadata": { "created": "...", "updated": "...", "version": 2 },
//!   "app": { "db_password": "ciphertextB64.nonceB64.tagB64" }
//! }
//! ```

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cipher::EncryptedField;
use crate::metadata::Metadata;

/// Reserved product name under which the metadata is persisted, plaintext.
pub const METADATA_PRODUCT: &str = "vault_metadata";

/// The named encrypted secrets of one product.
pub type ProductSecrets = BTreeMap<String, EncryptedField>;

/// One vault: metadata plus products of encrypted secrets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VaultRecord {
    /// Server-maintained bookkeeping, stored plaintext.
    pub metadata: Metadata,
    /// Product name → secret name → encrypted value.
    pub products: BTreeMap<String, ProductSecrets>,
}

impl Serialize for VaultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.products.len() + 1))?;
        map.serialize_entry(METADATA_PRODUCT, &self.metadata)?;
        for (name, secrets) in &self.products {
            map.serialize_entry(name, secrets)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VaultRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;

        let metadata = match raw.remove(METADATA_PRODUCT) {
            Some(value) => serde_json::from_value(value).map_err(D::Error::custom)?,
            None => Metadata::default(),
        };

        let mut products = BTreeMap::new();
        for (name, value) in raw {
            let secrets: ProductSecrets =
                serde_json::from_value(value).map_err(|e| {
                    D::Error::custom(format!("product '{name}': {e}"))
                })?;
            products.insert(name, secrets);
        }

        Ok(Self { metadata, products })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cipher::encrypt_field;
    use crate::kdf::derive_key;

    fn sample_record() -> VaultRecord {
        let key = derive_key("project", "salt", 1_000);
        let mut record = VaultRecord::default();
        record.metadata.touch();
        record
            .products
            .entry("app".to_owned())
            .or_default()
            .insert("db_password".to_owned(), encrypt_field("hunter2", &key).unwrap());
        record
    }

    #[test]
    fn serializes_to_persisted_layout() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["vault_metadata"]["version"], 1);
        let field = json["app"]["db_password"].as_str().unwrap();
        assert_eq!(field.split('.').count(), 3);
    }

    #[test]
    fn serde_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_value(&record).unwrap();
        let back: VaultRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn deserialize_without_metadata_defaults() {
        let back: VaultRecord = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(back.metadata.version, 0);
        assert!(back.products.is_empty());
    }

    #[test]
    fn deserialize_rejects_malformed_field() {
        let result: Result<VaultRecord, _> = serde_json::from_value(serde_json::json!({
            "app": { "db_password": "not-a-wire-string" }
        }));
        assert!(result.is_err());
    }

    #[test]
    fn metadata_extra_keys_survive_roundtrip() {
        let mut record = sample_record();
        record.metadata.set_extra("owner", "team-a".to_owned());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["vault_metadata"]["owner"], "team-a");
        let back: VaultRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
