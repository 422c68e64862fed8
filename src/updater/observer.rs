//! Observers for update lifecycle events.

use super::types::UpdateEvent;
use std::sync::{Mutex, PoisonError};
use tracing::{error, info, warn};

/// Receives every event an update emits, in order.
pub trait UpdateObserver: Send + Sync {
    fn on_event(&self, event: &UpdateEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl UpdateObserver for TracingObserver {
    fn on_event(&self, event: &UpdateEvent) {
        match event {
            UpdateEvent::PreValidationFailed { reason } => warn!(%reason, "Pre-validation failed"),
            UpdateEvent::InstallSucceeded { label } => info!(migration = %label, "Migration installed"),
            UpdateEvent::InstallFailed { reason } => error!(%reason, "Migration install failed"),
            UpdateEvent::UpdateSucceeded {
                target_version,
                total_applied,
            } => info!(
                target = %target_version,
                count = total_applied,
                "Storage updated"
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<UpdateEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<UpdateEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn pre_validation_failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UpdateEvent::PreValidationFailed { reason } => Some(reason),
                _ => None,
            })
            .collect()
    }

    pub fn installed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UpdateEvent::InstallSucceeded { label } => Some(label),
                _ => None,
            })
            .collect()
    }

    pub fn install_failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UpdateEvent::InstallFailed { reason } => Some(reason),
                _ => None,
            })
            .collect()
    }

    pub fn update_successes(&self) -> Vec<(String, u32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UpdateEvent::UpdateSucceeded {
                    target_version,
                    total_applied,
                } => Some((target_version, total_applied)),
                _ => None,
            })
            .collect()
    }
}

impl UpdateObserver for EventLog {
    fn on_event(&self, event: &UpdateEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
