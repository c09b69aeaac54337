//! Server configuration for Cove.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `COVE_*` environment variables.

use std::net::SocketAddr;

use cove_core::kdf::DEFAULT_KDF_ITERATIONS;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Admin API key gating vault creation. When unset, creation is refused.
    pub admin_api_key: Option<String>,
    /// PBKDF2 iteration count for vault key derivation.
    pub kdf_iterations: u32,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// PostgreSQL persistent storage.
    Postgres { url: String },
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (binds to `0.0.0.0`)
    /// - `COVE_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8300`)
    /// - `COVE_STORAGE` — `memory` or `postgres` (default: `memory`)
    /// - `DATABASE_URL` — PostgreSQL connection string (required when `COVE_STORAGE=postgres`)
    /// - `COVE_LOG_LEVEL` — log filter (default: `info`)
    /// - `COVE_API_KEY` — admin credential for `POST /create_vault`
    /// - `COVE_KDF_ITERATIONS` — PBKDF2 cost (default: `500000`)
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = if let Ok(addr) = std::env::var("COVE_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8300)))
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(8300);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 8300))
        };

        let storage_backend = match std::env::var("COVE_STORAGE")
            .unwrap_or_else(|_| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => {
                let url = std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/cove".to_owned());
                StorageBackendType::Postgres { url }
            }
            _ => StorageBackendType::Memory,
        };

        let log_level = std::env::var("COVE_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        let admin_api_key = std::env::var("COVE_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let kdf_iterations = std::env::var("COVE_KDF_ITERATIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_KDF_ITERATIONS);

        Self {
            bind_addr,
            storage_backend,
            log_level,
            admin_api_key,
            kdf_iterations,
        }
    }
}
