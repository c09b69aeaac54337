//! Vault metadata bookkeeping.
//!
//! Every vault carries server-maintained metadata: `created` (set once),
//! `updated` (refreshed on every write), and `version` (incremented by
//! exactly 1 on every successful create or update). Clients may attach
//! arbitrary extra keys through the reserved `vault_metadata` product, but
//! the three bookkeeping names are owned by [`Metadata::touch`] — client
//! writes to them are silently ignored, and they can never be deleted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Names owned by `touch` — not writable or deletable through payloads.
const RESERVED_KEYS: [&str; 3] = ["created", "updated", "version"];

/// Timestamp format used for `created`/`updated` and token timestamps.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in the vault timestamp format.
pub(crate) fn now_stamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Server-maintained vault metadata plus client-supplied extra keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// First-write timestamp. Set once, immutable thereafter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Last-write timestamp. Refreshed on every create/update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    /// Write counter. Increments by exactly 1 per successful create/update,
    /// so it is >= 1 on any persisted record.
    #[serde(default)]
    pub version: u32,

    /// Open map of client-supplied keys, stored plaintext.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    /// Advance the bookkeeping fields for a successful write.
    ///
    /// Sets `created` on the first write only, always refreshes `updated`,
    /// and increments `version`. All extra keys pass through unchanged.
    /// Called unconditionally at the end of every create/update — an update
    /// that changed no field still advances `version` and `updated`.
    pub fn touch(&mut self) {
        let now = now_stamp();
        if self.created.is_none() {
            self.created = Some(now.clone());
        }
        self.updated = Some(now);
        self.version += 1;
    }

    /// Set a client-supplied extra key.
    ///
    /// Writes to the reserved bookkeeping names are silently ignored — not
    /// an error, matching the update merge contract.
    pub fn set_extra(&mut self, name: &str, value: String) {
        if RESERVED_KEYS.contains(&name) {
            return;
        }
        self.extra.insert(name.to_owned(), serde_json::Value::String(value));
    }

    /// Remove a client-supplied extra key, if present.
    ///
    /// The reserved bookkeeping names live outside the extra map, so they
    /// are undeletable by construction.
    pub fn remove_extra(&mut self, name: &str) {
        self.extra.remove(name);
    }
}
