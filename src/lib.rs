pub mod config;
pub mod migration;
pub mod storage;
pub mod updater;
pub mod utils;
pub mod version;

// Re-export commonly used types
pub use config::{read_config, ConfigError, UpdaterConfig};
pub use migration::{
    FsMigrationProvider, MigrationDirection, MigrationError, MigrationPlan, MigrationRecord,
    MigrationSet, MigrationSource, ValidationIssue, ValidationReport,
};
pub use storage::{MetaInfo, SqliteStorage, StorageBackend, StorageError};
pub use updater::{
    EventLog, PreconditionFailure, StorageUpdater, TracingObserver, UpdateError, UpdateEvent,
    UpdateObserver, UpdateOutcome, UpdateResult,
};
pub use version::{SemVer, VersionError, VersionPart};
