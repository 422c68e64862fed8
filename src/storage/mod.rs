//! Storage backends the updater applies migrations to.
//!
//! The updater only talks to a [`StorageBackend`]: a small capability set for
//! reachability, provisioning, the persisted schema version and raw script
//! execution. [`SqliteStorage`] is the bundled implementation.

mod connection;
mod sqlite;
mod types;

pub use connection::{create_pool, create_test_pool, ConnectionError, PoolConfig};
pub use sqlite::SqliteStorage;
pub use types::MetaInfo;

use crate::migration::MigrationDirection;
use async_trait::async_trait;
use thiserror::Error;

/// Error types for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Storage is not provisioned: {0}")]
    NotProvisioned(String),

    #[error("Schema version cannot move below 0")]
    VersionUnderflow,

    #[error("Corrupted metadata: {0}")]
    CorruptedMetadata(String),

    #[error("{0}")]
    Execution(String),
}

/// Capabilities the updater needs from a database.
///
/// `advance_version` must only be called after the matching `execute`
/// succeeded, so the persisted version always equals the number of steps
/// that actually committed.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Whether the backend can be reached at all.
    async fn is_available(&self) -> bool;

    /// Whether the version-tracking metadata exists.
    async fn is_provisioned(&self) -> Result<bool, StorageError>;

    /// Create the version-tracking metadata with schema version 0.
    async fn provision(&self) -> Result<(), StorageError>;

    /// Read the persisted schema version.
    async fn current_version(&self) -> Result<u32, StorageError>;

    /// Run one migration script.
    async fn execute(&self, script: &str) -> Result<(), StorageError>;

    /// Move the persisted schema version by exactly one step.
    async fn advance_version(&self, direction: MigrationDirection) -> Result<(), StorageError>;
}
