mod hash;

pub use hash::compute_script_checksum;

/// Subdirectory holding forward (install) scripts
pub const UP_DIR: &str = "up";

/// Subdirectory holding backward (uninstall) scripts
pub const DOWN_DIR: &str = "down";

/// Table holding the single persisted metadata row
pub const META_TABLE: &str = "meta_versions";

/// Get current timestamp in ISO 8601 format
pub fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}
