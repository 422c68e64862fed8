//! Storage updater driving migrations against a backend.

use super::observer::UpdateObserver;
use super::types::{
    AppliedStep, PreconditionFailure, UpdateError, UpdateEvent, UpdateOutcome, UpdateResult,
};
use crate::migration::{MigrationError, MigrationSource};
use crate::storage::StorageBackend;
use crate::utils::now_iso;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Moves a storage backend to a requested schema version.
///
/// The updater holds no state between calls; the persisted schema version is
/// the only record of progress. Each step is checkpointed right after its
/// script succeeds, so a failed or interrupted run can be retried with the
/// same target and continues where it stopped.
pub struct StorageUpdater {
    backend: Arc<dyn StorageBackend>,
    source: Arc<dyn MigrationSource>,
    observers: Vec<Arc<dyn UpdateObserver>>,
}

impl StorageUpdater {
    /// Create an updater for `backend` using migrations from `source`.
    pub fn new(backend: Arc<dyn StorageBackend>, source: Arc<dyn MigrationSource>) -> Self {
        Self {
            backend,
            source,
            observers: Vec::new(),
        }
    }

    /// Register an observer that receives every lifecycle event.
    pub fn with_observer(mut self, observer: Arc<dyn UpdateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Update storage to `target_version`.
    ///
    /// This method:
    /// 1. Checks the backend is reachable
    /// 2. Provisions version metadata if missing
    /// 3. Reads the current schema version and loads one migration snapshot
    /// 4. Rejects unreachable or no-op targets, then resolves the steps against that snapshot
    /// 5. Executes each step, checkpointing the version after each success
    ///
    /// Unmet preconditions are reported through events and the returned
    /// outcome. A failing step is reported and then returned as
    /// [`UpdateError::StepFailed`]; already applied steps stay applied.
    pub async fn update_storage(&self, target_version: u32) -> Result<UpdateResult, UpdateError> {
        self.run(target_version, None).await
    }

    /// Like [`update_storage`](Self::update_storage), but stops before the next
    /// step once `shutdown` holds `true`. A running script is never interrupted.
    pub async fn update_storage_with_shutdown(
        &self,
        target_version: u32,
        shutdown: watch::Receiver<bool>,
    ) -> Result<UpdateResult, UpdateError> {
        self.run(target_version, Some(shutdown)).await
    }

    async fn run(
        &self,
        target: u32,
        shutdown: Option<watch::Receiver<bool>>,
    ) -> Result<UpdateResult, UpdateError> {
        if !self.backend.is_available().await {
            return Ok(self.precondition_failed(PreconditionFailure::StorageUnavailable, None, target));
        }

        if !self.backend.is_provisioned().await? {
            info!("Storage is not provisioned, provisioning");
            self.backend.provision().await.map_err(UpdateError::Provision)?;
        }

        let current = self.backend.current_version().await?;
        info!(from = current, to = target, "Starting storage update");

        // One snapshot per call; every check below reads the same set.
        let set = match self.source.load().await {
            Ok(set) => set,
            Err(e) => return Err(self.discovery_failed(e)),
        };
        let last = set.last_version();

        let precondition = if target > last {
            Some(PreconditionFailure::TargetAboveLast { target, last })
        } else if current > last {
            Some(PreconditionFailure::CurrentAboveLast { current, last })
        } else if current == target {
            Some(PreconditionFailure::AlreadyAtVersion(target))
        } else {
            None
        };
        if let Some(failure) = precondition {
            return Ok(self.precondition_failed(failure, Some(current), target));
        }

        let plan = match set.resolve(current, target) {
            Ok(plan) => plan,
            Err(e) => return Err(self.discovery_failed(e)),
        };
        debug!(
            direction = %plan.direction,
            steps = plan.len(),
            "Resolved migration range"
        );

        let direction = plan.direction;
        let mut applied: Vec<AppliedStep> = Vec::with_capacity(plan.len());

        for step in &plan.steps {
            if is_cancelled(shutdown.as_ref()) {
                warn!(
                    applied = applied.len(),
                    remaining = plan.len() - applied.len(),
                    "Update cancelled between steps"
                );
                return Ok(UpdateResult {
                    outcome: UpdateOutcome::Cancelled,
                    from_version: Some(current),
                    to_version: target,
                    migrations_applied: applied,
                });
            }

            let label = step.label(direction);
            debug!(migration = %label, checksum = %step.checksum, "Applying migration");

            let committed = match self.backend.execute(step.script(direction)).await {
                Ok(()) => self.backend.advance_version(direction).await,
                Err(e) => Err(e),
            };

            if let Err(source) = committed {
                self.emit(UpdateEvent::InstallFailed {
                    reason: source.to_string(),
                });
                return Err(UpdateError::StepFailed {
                    name: step.name.clone(),
                    direction,
                    applied: applied.len() as u32,
                    source,
                });
            }

            applied.push(AppliedStep {
                order_number: step.order_number,
                name: step.name.clone(),
                direction,
                applied_at: now_iso(),
            });
            self.emit(UpdateEvent::InstallSucceeded { label });
        }

        let result = UpdateResult {
            outcome: UpdateOutcome::Succeeded,
            from_version: Some(current),
            to_version: target,
            migrations_applied: applied,
        };

        info!(
            from = current,
            to = target,
            count = result.total_applied(),
            "Storage update completed"
        );
        self.emit(UpdateEvent::UpdateSucceeded {
            target_version: target.to_string(),
            total_applied: result.total_applied(),
        });

        Ok(result)
    }

    fn emit(&self, event: UpdateEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    fn precondition_failed(
        &self,
        failure: PreconditionFailure,
        from_version: Option<u32>,
        target: u32,
    ) -> UpdateResult {
        self.emit(UpdateEvent::PreValidationFailed {
            reason: failure.to_string(),
        });
        UpdateResult {
            outcome: UpdateOutcome::PreconditionFailed(failure),
            from_version,
            to_version: target,
            migrations_applied: Vec::new(),
        }
    }

    fn discovery_failed(&self, error: MigrationError) -> UpdateError {
        self.emit(UpdateEvent::PreValidationFailed {
            reason: format!("Failed to update storage: couldn't get migration list: {error}"),
        });
        UpdateError::Discovery(error)
    }
}

fn is_cancelled(shutdown: Option<&watch::Receiver<bool>>) -> bool {
    shutdown.map_or(false, |rx| *rx.borrow())
}
