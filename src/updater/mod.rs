//! Storage update orchestration.
//!
//! [`StorageUpdater`] takes a [`StorageBackend`](crate::storage::StorageBackend)
//! and a [`MigrationSource`](crate::migration::MigrationSource) and walks the
//! database to a requested schema version one step at a time.
//!
//! # Overview
//!
//! - Validating: backend reachable, metadata provisioned, target reachable
//!   and different from the current version
//! - Applying: each step runs its script, then moves the persisted version by one
//! - Progress is reported to [`UpdateObserver`]s and summarised in an
//!   [`UpdateResult`]
//! - A failed step stops the run; nothing already applied is undone
//!
//! Only one update may run against a given database at a time. No locking is
//! done here; deployments that can race need an external lock around the call.

mod executor;
mod observer;
mod types;

pub use executor::StorageUpdater;
pub use observer::{EventLog, TracingObserver, UpdateObserver};
pub use types::{
    AppliedStep, PreconditionFailure, UpdateError, UpdateEvent, UpdateOutcome, UpdateResult,
};
