//! Filesystem migration provider.

use super::naming::parse_order_number;
use super::set::MigrationSet;
use super::types::{MigrationError, MigrationRecord, MigrationSource};
use super::validation::validate_structure;
use crate::utils::{DOWN_DIR, UP_DIR};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Reads migrations from a root directory holding `up/` and `down/`.
///
/// The directory is the source of truth: every call re-reads and re-validates
/// it, nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct FsMigrationProvider {
    root: PathBuf,
}

impl FsMigrationProvider {
    /// Create a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate the directory layout and filenames without reading any script.
    pub async fn validate(&self) -> Result<(), MigrationError> {
        let (up_dir, down_dir) = self.subdirectories()?;
        let up_names = list_file_names(&up_dir).await?;
        let down_names = list_file_names(&down_dir).await?;
        validate_structure(&up_names, &down_names).into_result()
    }

    /// Discover, validate and load every migration.
    pub async fn load(&self) -> Result<MigrationSet, MigrationError> {
        let (up_dir, down_dir) = self.subdirectories()?;
        let mut up_names = list_file_names(&up_dir).await?;
        let mut down_names = list_file_names(&down_dir).await?;

        validate_structure(&up_names, &down_names).into_result()?;

        up_names.sort_unstable();
        down_names.sort_unstable();

        let mut records = Vec::with_capacity(up_names.len());
        for (up_name, down_name) in up_names.iter().zip(&down_names) {
            let order_number = parse_order_number(up_name)?;
            let install_text = read_script(&up_dir.join(up_name)).await?;
            let uninstall_text = read_script(&down_dir.join(down_name)).await?;

            let record = MigrationRecord::new(order_number, up_name.as_str(), install_text, uninstall_text);
            debug!(
                order = record.order_number,
                name = %record.name,
                checksum = %record.checksum,
                "Discovered migration"
            );
            records.push(record);
        }

        let set = MigrationSet::from_records(records)?;
        info!(
            root = %self.root.display(),
            count = set.len(),
            "Loaded migrations"
        );
        Ok(set)
    }

    fn subdirectories(&self) -> Result<(PathBuf, PathBuf), MigrationError> {
        if !self.root.is_dir() {
            return Err(MigrationError::NotFound(self.root.clone()));
        }

        let up_dir = self.root.join(UP_DIR);
        if !up_dir.is_dir() {
            return Err(MigrationError::NotFound(up_dir));
        }

        let down_dir = self.root.join(DOWN_DIR);
        if !down_dir.is_dir() {
            return Err(MigrationError::NotFound(down_dir));
        }

        Ok((up_dir, down_dir))
    }
}

#[async_trait]
impl MigrationSource for FsMigrationProvider {
    async fn load(&self) -> Result<MigrationSet, MigrationError> {
        FsMigrationProvider::load(self).await
    }
}

/// Names of the regular files directly inside `dir`.
async fn list_file_names(dir: &Path) -> Result<Vec<String>, MigrationError> {
    let io_error = |source| MigrationError::IoError {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(io_error)?;

    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        if entry.file_type().await.map_err(io_error)?.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }

    Ok(names)
}

async fn read_script(path: &Path) -> Result<String, MigrationError> {
    fs::read_to_string(path)
        .await
        .map_err(|source| MigrationError::IoError {
            path: path.to_path_buf(),
            source,
        })
}
