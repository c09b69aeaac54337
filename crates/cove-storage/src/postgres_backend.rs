//! PostgreSQL vault store.
//!
//! One row per vault in a single `vault` table: `project_key` text primary
//! key, `record` JSONB. Every query binds its parameters — the project key
//! is caller-influenced and must never be interpolated into SQL.
//!
//! Feature-gated behind `postgres-backend`. Uses `sqlx` with the Tokio
//! runtime for fully async operations.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::{StoreError, VaultStore};

/// A vault store backed by PostgreSQL.
///
/// Thread-safe via `PgPool`; connections are acquired per query and returned
/// to the pool, so no long-lived cursor is held across requests.
///
/// # Examples
///
/// ```no_run
/// # use cove_storage::PostgresBackend;
/// # #[tokio::main]
/// # async fn main() {
/// let store = PostgresBackend::connect("postgres://localhost/cove").await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl std::fmt::Debug for PostgresBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresBackend")
            .field("pool", &"[PgPool]")
            .finish_non_exhaustive()
    }
}

impl PostgresBackend {
    /// Connect to PostgreSQL and run the initial migration.
    ///
    /// Creates the `vault` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Open`] if the connection or migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Open {
                path: database_url.to_owned(),
                reason: e.to_string(),
            })?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vault (\
                project_key TEXT  PRIMARY KEY, \
                record      JSONB NOT NULL\
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::Open {
            path: database_url.to_owned(),
            reason: format!("migration failed: {e}"),
        })?;

        Ok(Self { pool })
    }

    /// Return a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl VaultStore for PostgresBackend {
    async fn get(&self, project_key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT record FROM vault WHERE project_key = $1")
                .bind(project_key)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Read {
                    reason: e.to_string(),
                })?;

        Ok(row.map(|(record,)| record))
    }

    async fn create(
        &self,
        project_key: &str,
        record: &serde_json::Value,
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO vault (project_key, record) VALUES ($1, $2)")
            .bind(project_key)
            .bind(record)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    StoreError::Conflict
                } else {
                    StoreError::Write {
                        reason: e.to_string(),
                    }
                }
            })?;

        Ok(())
    }

    async fn save(&self, project_key: &str, record: &serde_json::Value) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO vault (project_key, record) VALUES ($1, $2) \
             ON CONFLICT (project_key) DO UPDATE SET record = EXCLUDED.record",
        )
        .bind(project_key)
        .bind(record)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Write {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
