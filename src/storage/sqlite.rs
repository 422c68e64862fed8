//! SQLite implementation of the storage capabilities and the metadata row.

use super::connection::{create_pool, PoolConfig};
use super::types::MetaInfo;
use super::{StorageBackend, StorageError};
use crate::migration::MigrationDirection;
use crate::utils::META_TABLE;
use crate::version::{SemVer, VersionPart};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Storage backed by a SQLite database.
///
/// Versions live in a single-row `meta_versions` table:
/// `database_version` is the schema version, `service_version` a JSON
/// `[major, minor, patch]` array.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `database_url` and wrap it.
    pub async fn connect(database_url: &str, config: Option<PoolConfig>) -> Result<Self, StorageError> {
        let pool = create_pool(database_url, config).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read the whole metadata row.
    pub async fn meta_info(&self) -> Result<MetaInfo, StorageError> {
        let sql = format!("SELECT database_version, service_version FROM {META_TABLE} WHERE single_row = 1");
        let row: Option<(i64, String)> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
        let (database_version, service_version) = row.ok_or_else(missing_row)?;

        Ok(MetaInfo {
            database_version: to_schema_version(database_version)?,
            service_version: parse_service_version(&service_version)?,
        })
    }

    /// Overwrite the schema version without running any script.
    pub async fn set_database_version(&self, version: u32) -> Result<(), StorageError> {
        let sql = format!("UPDATE {META_TABLE} SET database_version = ? WHERE single_row = 1");
        let result = sqlx::query(&sql)
            .bind(i64::from(version))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(missing_row());
        }

        info!(version, "Schema version set");
        Ok(())
    }

    pub async fn service_version(&self) -> Result<SemVer, StorageError> {
        Ok(self.meta_info().await?.service_version)
    }

    pub async fn set_service_version(&self, version: &SemVer) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&version.to_parts())
            .map_err(|e| StorageError::CorruptedMetadata(e.to_string()))?;
        let sql = format!("UPDATE {META_TABLE} SET service_version = ? WHERE single_row = 1");
        let result = sqlx::query(&sql)
            .bind(encoded)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(missing_row());
        }

        info!(version = %version, "Service version set");
        Ok(())
    }

    /// Replace one component of the service version and return the new value.
    pub async fn set_service_version_part(&self, part: VersionPart, value: u32) -> Result<SemVer, StorageError> {
        let next = self.service_version().await?.with_part(part, value);
        self.set_service_version(&next).await?;
        Ok(next)
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn is_available(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn is_provisioned(&self) -> Result<bool, StorageError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(META_TABLE)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn provision(&self) -> Result<(), StorageError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {META_TABLE} (
                single_row INTEGER PRIMARY KEY DEFAULT 1 CHECK (single_row = 1),
                database_version INTEGER NOT NULL DEFAULT 0 CHECK (database_version >= 0),
                service_version TEXT NOT NULL DEFAULT '[0,0,0]'
            );
            INSERT OR IGNORE INTO {META_TABLE} (single_row, database_version, service_version)
            VALUES (1, 0, '[0,0,0]');"
        );
        sqlx::raw_sql(&sql).execute(&self.pool).await?;

        info!(table = META_TABLE, "Provisioned version metadata");
        Ok(())
    }

    async fn current_version(&self) -> Result<u32, StorageError> {
        Ok(self.meta_info().await?.database_version)
    }

    /// Runs the whole script in one transaction; a failing statement rolls
    /// back every statement before it.
    async fn execute(&self, script: &str) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        let conn: &mut sqlx::SqliteConnection = &mut tx;
        sqlx::Executor::execute(conn, sqlx::raw_sql(script)).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn advance_version(&self, direction: MigrationDirection) -> Result<(), StorageError> {
        let sql = match direction {
            MigrationDirection::Up => format!(
                "UPDATE {META_TABLE} SET database_version = database_version + 1 WHERE single_row = 1"
            ),
            MigrationDirection::Down => format!(
                "UPDATE {META_TABLE} SET database_version = database_version - 1
                 WHERE single_row = 1 AND database_version > 0"
            ),
        };
        let result = sqlx::query(&sql).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            // Either the row is missing or we are already at 0.
            self.current_version().await?;
            return Err(StorageError::VersionUnderflow);
        }

        debug!(direction = %direction, "Schema version advanced");
        Ok(())
    }
}

fn missing_row() -> StorageError {
    StorageError::NotProvisioned(format!("no row in {META_TABLE}"))
}

fn to_schema_version(raw: i64) -> Result<u32, StorageError> {
    u32::try_from(raw)
        .map_err(|_| StorageError::CorruptedMetadata(format!("database_version {raw} is not a valid schema version")))
}

fn parse_service_version(raw: &str) -> Result<SemVer, StorageError> {
    serde_json::from_str::<[u32; 3]>(raw)
        .map(SemVer::from)
        .map_err(|e| StorageError::CorruptedMetadata(format!("service_version '{raw}': {e}")))
}
