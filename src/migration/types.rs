//! Types for the migration system.

use super::naming::OrderNumberError;
use super::set::MigrationSet;
use super::validation::ValidationReport;
use crate::utils::compute_script_checksum;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error types for migration discovery and resolution.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Migration directory not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Migrations validation failed:\n{0}")]
    Validation(ValidationReport),

    #[error("IO error at {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid order number: {0}")]
    OrderNumber(#[from] OrderNumberError),

    #[error("Version {version} is outside the available range 0..={last}")]
    VersionOutOfRange { version: u32, last: u32 },
}

/// Direction of migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDirection {
    /// Moving to a higher schema version.
    Up,
    /// Moving to a lower schema version.
    Down,
}

impl MigrationDirection {
    /// Direction needed to go from `current` to `target`. Equal versions count as `Down`,
    /// which resolves to an empty step list.
    pub fn between(current: u32, target: u32) -> Self {
        if target > current {
            MigrationDirection::Up
        } else {
            MigrationDirection::Down
        }
    }

    pub fn is_forward(self) -> bool {
        self == MigrationDirection::Up
    }

    /// Short tag used in event labels and logs.
    pub fn label(self) -> &'static str {
        match self {
            MigrationDirection::Up => "up",
            MigrationDirection::Down => "down",
        }
    }
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One reversible schema change built from a paired up/down file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Position in the set, starting at 1.
    pub order_number: u32,
    /// Filename of the up script.
    pub name: String,
    /// Script run when moving forward through this record.
    pub install_text: String,
    /// Script run when moving backward through this record.
    pub uninstall_text: String,
    /// SHA-256 over both scripts.
    pub checksum: String,
}

impl MigrationRecord {
    pub fn new(
        order_number: u32,
        name: impl Into<String>,
        install_text: impl Into<String>,
        uninstall_text: impl Into<String>,
    ) -> Self {
        let install_text = install_text.into();
        let uninstall_text = uninstall_text.into();
        let checksum = compute_script_checksum(&install_text, &uninstall_text);
        Self {
            order_number,
            name: name.into(),
            install_text,
            uninstall_text,
            checksum,
        }
    }

    /// The script to execute when traversing this record in `direction`.
    pub fn script(&self, direction: MigrationDirection) -> &str {
        match direction {
            MigrationDirection::Up => &self.install_text,
            MigrationDirection::Down => &self.uninstall_text,
        }
    }

    /// Label reported when this record is applied, e.g. `[up] 3-add_users.sql`.
    pub fn label(&self, direction: MigrationDirection) -> String {
        format!("[{}] {}", direction, self.name)
    }
}

/// Steps resolved for a `(current, target)` pair, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub direction: MigrationDirection,
    pub steps: Vec<MigrationRecord>,
}

impl MigrationPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Order numbers in execution order.
    pub fn order_numbers(&self) -> Vec<u32> {
        self.steps.iter().map(|s| s.order_number).collect()
    }
}

/// Anything that can answer "which steps take me from A to B".
///
/// Implemented by the on-disk provider and by an in-memory [`MigrationSet`].
/// Each call to [`load`](Self::load) returns one consistent snapshot; callers
/// that need several answers should load once and query the set.
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// Current snapshot of every migration.
    async fn load(&self) -> Result<MigrationSet, MigrationError>;

    /// Resolve the ordered steps between two schema versions.
    async fn resolve(&self, current: u32, target: u32) -> Result<MigrationPlan, MigrationError> {
        self.load().await?.resolve(current, target)
    }

    /// Highest reachable schema version.
    async fn last_version(&self) -> Result<u32, MigrationError> {
        Ok(self.load().await?.last_version())
    }
}
