//! Core library for Cove.
//!
//! Contains the vault key token codec, PBKDF2 key derivation, per-field
//! AES-256-GCM encryption, metadata versioning, and the vault engine that
//! applies create and merge-update operations. This crate depends on
//! `cove-storage` for the record store trait and knows nothing about the
//! HTTP transport.

pub mod cipher;
pub mod engine;
pub mod error;
pub mod kdf;
pub mod metadata;
pub mod record;
pub mod token;
