//! Types for the storage updater.

use crate::migration::{MigrationDirection, MigrationError};
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that end an update call abnormally.
///
/// Expected conditions such as an unreachable database or a no-op request are
/// not errors; they come back as [`UpdateOutcome::PreconditionFailed`].
#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Provisioning failed: {0}")]
    Provision(#[source] StorageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Migration discovery failed: {0}")]
    Discovery(#[from] MigrationError),

    #[error("Migration {name} ({direction}) failed after {applied} applied step(s): {source}")]
    StepFailed {
        name: String,
        direction: MigrationDirection,
        applied: u32,
        #[source]
        source: StorageError,
    },
}

/// Why an update did not start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionFailure {
    #[error("Failed to update storage: couldn't connect to storage")]
    StorageUnavailable,

    #[error("Failed to update storage: target version {target} is higher than last available version {last}")]
    TargetAboveLast { target: u32, last: u32 },

    #[error("Failed to update storage: current version {current} is higher than last available version {last}, are you missing some migrations?")]
    CurrentAboveLast { current: u32, last: u32 },

    #[error("Failed to update storage: already at version {0}")]
    AlreadyAtVersion(u32),
}

/// Lifecycle notifications emitted while updating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateEvent {
    PreValidationFailed { reason: String },
    InstallSucceeded { label: String },
    InstallFailed { reason: String },
    UpdateSucceeded { target_version: String, total_applied: u32 },
}

/// How an update call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Every resolved step was applied.
    Succeeded,
    /// Nothing was executed.
    PreconditionFailed(PreconditionFailure),
    /// A shutdown signal arrived between steps.
    Cancelled,
}

/// A step that was executed and checkpointed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    pub order_number: u32,
    pub name: String,
    pub direction: MigrationDirection,
    /// RFC 3339 time the version checkpoint was written.
    pub applied_at: String,
}

/// Result of an update call that did not fail fatally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    pub outcome: UpdateOutcome,
    /// Schema version read at the start, if storage was reachable.
    pub from_version: Option<u32>,
    /// The requested target version.
    pub to_version: u32,
    /// Steps applied, in execution order.
    pub migrations_applied: Vec<AppliedStep>,
}

impl UpdateResult {
    pub fn success(&self) -> bool {
        self.outcome == UpdateOutcome::Succeeded
    }

    pub fn total_applied(&self) -> u32 {
        self.migrations_applied.len() as u32
    }
}
