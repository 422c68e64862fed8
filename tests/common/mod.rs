#![allow(dead_code)]

use async_trait::async_trait;
use schema_updater::{MigrationDirection, MigrationRecord, MigrationSet, StorageBackend, StorageError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;
use tokio::sync::watch;

/// Create a temporary directory for testing
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Write one file, creating parent directories.
pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create directory");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

/// Write `<root>/up/<name>` and `<root>/down/<name>` for each entry.
pub fn write_migrations(root: &Path, migrations: &[(&str, &str, &str)]) {
    std::fs::create_dir_all(root.join("up")).expect("Failed to create up dir");
    std::fs::create_dir_all(root.join("down")).expect("Failed to create down dir");
    for (name, up, down) in migrations {
        write_file(&root.join("up").join(name), up);
        write_file(&root.join("down").join(name), down);
    }
}

/// Write `n` migrations named `<i>-a.sql` whose scripts are `up <i>` / `down <i>`.
pub fn write_numbered_migrations(root: &Path, n: u32) {
    std::fs::create_dir_all(root.join("up")).expect("Failed to create up dir");
    std::fs::create_dir_all(root.join("down")).expect("Failed to create down dir");
    for i in 1..=n {
        write_file(&root.join("up").join(format!("{i}-a.sql")), &format!("up {i}"));
        write_file(&root.join("down").join(format!("{i}-a.sql")), &format!("down {i}"));
    }
}

/// In-memory set of `n` migrations matching [`write_numbered_migrations`].
pub fn numbered_set(n: u32) -> MigrationSet {
    let records = (1..=n)
        .map(|i| MigrationRecord::new(i, format!("{i}-a.sql"), format!("up {i}"), format!("down {i}")))
        .collect();
    MigrationSet::from_records(records).expect("Numbered set should be valid")
}

/// Storage double that records every call.
pub struct RecordingBackend {
    available: bool,
    provisioned: Mutex<bool>,
    fail_provision: bool,
    version: Mutex<u32>,
    fail_on_execute: Option<usize>,
    cancel_after: Mutex<Option<(usize, watch::Sender<bool>)>>,
    executed: Mutex<Vec<String>>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl RecordingBackend {
    /// Reachable, provisioned backend at `version`.
    pub fn at_version(version: u32) -> Self {
        Self {
            available: true,
            provisioned: Mutex::new(true),
            fail_provision: false,
            version: Mutex::new(version),
            fail_on_execute: None,
            cancel_after: Mutex::new(None),
            executed: Mutex::new(Vec::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::at_version(0)
        }
    }

    pub fn unprovisioned() -> Self {
        let backend = Self::at_version(0);
        *backend.provisioned.lock().unwrap() = false;
        backend
    }

    /// Make provisioning fail.
    pub fn failing_provision(mut self) -> Self {
        self.fail_provision = true;
        self
    }

    /// Fail the `call`-th execute (1-based, counted across update calls).
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_execute = Some(call);
        self
    }

    /// Send `true` on `sender` once `call` executes have completed.
    pub fn cancelling_after(self, call: usize, sender: watch::Sender<bool>) -> Self {
        *self.cancel_after.lock().unwrap() = Some((call, sender));
        self
    }

    pub fn version(&self) -> u32 {
        *self.version.lock().unwrap()
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    fn record(&self, name: &'static str) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let count = calls.entry(name).or_insert(0);
        *count += 1;
        *count
    }
}

#[async_trait]
impl StorageBackend for RecordingBackend {
    async fn is_available(&self) -> bool {
        self.record("is_available");
        self.available
    }

    async fn is_provisioned(&self) -> Result<bool, StorageError> {
        self.record("is_provisioned");
        Ok(*self.provisioned.lock().unwrap())
    }

    async fn provision(&self) -> Result<(), StorageError> {
        self.record("provision");
        if self.fail_provision {
            return Err(StorageError::Execution("cannot create metadata".to_string()));
        }
        *self.provisioned.lock().unwrap() = true;
        *self.version.lock().unwrap() = 0;
        Ok(())
    }

    async fn current_version(&self) -> Result<u32, StorageError> {
        self.record("current_version");
        Ok(self.version())
    }

    async fn execute(&self, script: &str) -> Result<(), StorageError> {
        let call = self.record("execute");
        if self.fail_on_execute == Some(call) {
            return Err(StorageError::Execution("failed".to_string()));
        }
        self.executed.lock().unwrap().push(script.to_string());

        if let Some((after, sender)) = self.cancel_after.lock().unwrap().as_ref() {
            if *after == call {
                sender.send(true).ok();
            }
        }
        Ok(())
    }

    async fn advance_version(&self, direction: MigrationDirection) -> Result<(), StorageError> {
        self.record("advance_version");
        let mut version = self.version.lock().unwrap();
        match direction {
            MigrationDirection::Up => *version += 1,
            MigrationDirection::Down => {
                *version = version.checked_sub(1).ok_or(StorageError::VersionUnderflow)?;
            }
        }
        Ok(())
    }
}
