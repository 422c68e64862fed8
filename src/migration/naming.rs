//! Migration filename rules.
//!
//! A migration file is named `<order>-<slug>.sql`, where `<order>` is a run of
//! decimal digits and `<slug>` uses letters, digits, `_` and `-`.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Pattern every file in `up/` and `down/` must match.
pub const MIGRATION_NAME_PATTERN: &str = r"^[0-9]+-[a-zA-Z0-9_-]+\.sql$";

/// Largest accepted order number. Keeps versions representable as a signed
/// 32-bit column in any backend.
pub const MAX_ORDER_NUMBER: u32 = i32::MAX as u32;

static MIGRATION_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(MIGRATION_NAME_PATTERN).expect("migration name pattern is valid"));

/// Failure to read an order number out of a filename.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// The part before the first `-` is empty or contains a non-digit.
    #[error("'{0}' has no numeric order prefix")]
    Malformed(String),

    /// The prefix is numeric but zero or too large.
    #[error("'{0}' has an order number outside 1..={}", MAX_ORDER_NUMBER)]
    OutOfRange(String),
}

/// Check a filename against [`MIGRATION_NAME_PATTERN`].
pub fn is_valid_migration_name(name: &str) -> bool {
    MIGRATION_NAME_RE.is_match(name)
}

/// Extract the order number from a migration filename.
///
/// Everything before the first `-` (or the whole name if there is none) must be
/// decimal digits.
pub fn parse_order_number(name: &str) -> Result<u32, OrderNumberError> {
    let prefix = match name.find('-') {
        Some(end) => &name[..end],
        None => name,
    };

    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OrderNumberError::Malformed(name.to_string()));
    }

    // Digits only, so a parse failure can only mean overflow.
    match prefix.parse::<u64>() {
        Ok(n) if n >= 1 && n <= u64::from(MAX_ORDER_NUMBER) => Ok(n as u32),
        _ => Err(OrderNumberError::OutOfRange(name.to_string())),
    }
}
