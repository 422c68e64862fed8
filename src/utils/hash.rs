use sha2::{Digest, Sha256};

/// Compute the checksum of a migration from both of its scripts.
///
/// A NUL separator keeps `("ab", "c")` and `("a", "bc")` apart.
pub fn compute_script_checksum(install_text: &str, uninstall_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(install_text.as_bytes());
    hasher.update([0u8]);
    hasher.update(uninstall_text.as_bytes());
    hex::encode(hasher.finalize())
}
