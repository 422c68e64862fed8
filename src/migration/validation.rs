//! Structural validation of a migration directory.
//!
//! Every check runs to completion and all problems are collected into one
//! [`ValidationReport`], so a broken directory can be fixed in a single pass.

use super::naming::{is_valid_migration_name, parse_order_number, OrderNumberError};
use super::types::{MigrationDirection, MigrationError};
use std::fmt;
use thiserror::Error;

/// A single structural problem found during discovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Up and down migrations count mismatch: {up} up, {down} down")]
    CountMismatch { up: usize, down: usize },

    #[error("Migration {direction}: '{name}' has wrong name format")]
    InvalidName {
        direction: MigrationDirection,
        name: String,
    },

    #[error("Migration {direction}: {reason}")]
    InvalidOrder {
        direction: MigrationDirection,
        reason: OrderNumberError,
    },

    #[error("Up migration order {up_order} ('{up_name}') paired with down migration order {down_order} ('{down_name}')")]
    PairMismatch {
        up_order: u32,
        down_order: u32,
        up_name: String,
        down_name: String,
    },

    #[error("Migration order {order} is used more than once ('{name}')")]
    DuplicateOrder { order: u32, name: String },

    #[error("Migration order gap: expected {expected}, found {found} ('{name}')")]
    Gap {
        expected: u32,
        found: u32,
        name: String,
    },
}

/// Every issue found by one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// `Ok` when no issue was found, otherwise a validation error carrying all of them.
    pub fn into_result(self) -> Result<(), MigrationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(MigrationError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.issues.iter().map(|i| format!("  - {i}")).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Validate the filenames of an `up/` and `down/` directory pair.
///
/// Checks, in order: equal counts, the naming pattern for every file, order
/// numbers of files at the same lexicographic position, and finally that the
/// up order numbers form the sequence `1..=N`.
pub fn validate_structure(up_names: &[String], down_names: &[String]) -> ValidationReport {
    let mut issues = Vec::new();

    if up_names.len() != down_names.len() {
        issues.push(ValidationIssue::CountMismatch {
            up: up_names.len(),
            down: down_names.len(),
        });
    }

    for (direction, names) in [
        (MigrationDirection::Up, up_names),
        (MigrationDirection::Down, down_names),
    ] {
        for name in names {
            if !is_valid_migration_name(name) {
                issues.push(ValidationIssue::InvalidName {
                    direction,
                    name: name.clone(),
                });
            }
        }
    }

    let mut sorted_up: Vec<&str> = up_names.iter().map(String::as_str).collect();
    let mut sorted_down: Vec<&str> = down_names.iter().map(String::as_str).collect();
    sorted_up.sort_unstable();
    sorted_down.sort_unstable();

    let up_orders = collect_orders(MigrationDirection::Up, &sorted_up, &mut issues);
    let down_orders = collect_orders(MigrationDirection::Down, &sorted_down, &mut issues);

    for ((up_name, up_order), (down_name, down_order)) in sorted_up
        .iter()
        .zip(&up_orders)
        .zip(sorted_down.iter().zip(&down_orders))
    {
        if let (Some(up_order), Some(down_order)) = (up_order, down_order) {
            if up_order != down_order {
                issues.push(ValidationIssue::PairMismatch {
                    up_order: *up_order,
                    down_order: *down_order,
                    up_name: up_name.to_string(),
                    down_name: down_name.to_string(),
                });
            }
        }
    }

    let numbered_up = sorted_up
        .iter()
        .zip(&up_orders)
        .filter_map(|(name, order)| order.map(|o| (o, *name)));
    issues.extend(check_sequence(numbered_up));

    ValidationReport::new(issues)
}

/// Check that order numbers are unique and run from 1 without gaps.
pub fn check_sequence<'a, I>(entries: I) -> Vec<ValidationIssue>
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    let mut entries: Vec<(u32, &str)> = entries.into_iter().collect();
    entries.sort_unstable();

    let mut issues = Vec::new();
    let mut expected: u32 = 1;
    let mut previous: Option<u32> = None;

    for (order, name) in entries {
        if previous == Some(order) {
            issues.push(ValidationIssue::DuplicateOrder {
                order,
                name: name.to_string(),
            });
            continue;
        }
        if order != expected {
            issues.push(ValidationIssue::Gap {
                expected,
                found: order,
                name: name.to_string(),
            });
        }
        expected = order.saturating_add(1);
        previous = Some(order);
    }

    issues
}

fn collect_orders(
    direction: MigrationDirection,
    names: &[&str],
    issues: &mut Vec<ValidationIssue>,
) -> Vec<Option<u32>> {
    names
        .iter()
        .map(|name| match parse_order_number(name) {
            Ok(order) => Some(order),
            // Already reported by the naming pattern check.
            Err(OrderNumberError::Malformed(_)) => None,
            Err(reason) => {
                issues.push(ValidationIssue::InvalidOrder { direction, reason });
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_structure() {
        let up = names(&["2-b.sql", "1-a.sql", "3-c.sql"]);
        let down = names(&["1-a.sql", "3-c.sql", "2-b_undo.sql"]);
        let report = validate_structure(&up, &down);
        assert!(report.is_empty(), "unexpected issues: {report}");
    }

    #[test]
    fn test_empty_directories_are_valid() {
        assert!(validate_structure(&[], &[]).is_empty());
    }

    #[test]
    fn test_count_mismatch() {
        let up = names(&["1-a.sql", "2-b.sql"]);
        let down = names(&["1-a.sql"]);
        let report = validate_structure(&up, &down);
        assert!(report
            .issues()
            .contains(&ValidationIssue::CountMismatch { up: 2, down: 1 }));
    }

    #[test]
    fn test_all_bad_names_are_reported() {
        let up = names(&["abc-init.sql", "2-ok.sql", "3 bad.sql"]);
        let down = names(&["1-init.sql", "2-ok.sql", "3-bad.txt"]);
        let report = validate_structure(&up, &down);

        let bad: Vec<&str> = report
            .issues()
            .iter()
            .filter_map(|i| match i {
                ValidationIssue::InvalidName { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(bad, vec!["abc-init.sql", "3 bad.sql", "3-bad.txt"]);
        assert!(report.to_string().contains("abc-init.sql"));
    }

    #[test]
    fn test_pair_mismatch() {
        let up = names(&["1-a.sql", "2-b.sql"]);
        let down = names(&["1-a.sql", "3-b.sql"]);
        let report = validate_structure(&up, &down);
        assert!(report.issues().iter().any(|i| matches!(
            i,
            ValidationIssue::PairMismatch {
                up_order: 2,
                down_order: 3,
                ..
            }
        )));
        assert!(report
            .to_string()
            .contains("Up migration order 2 ('2-b.sql') paired with down migration order 3 ('3-b.sql')"));
    }

    #[test]
    fn test_zero_order_is_reported_per_file() {
        let up = names(&["0-a.sql"]);
        let down = names(&["0-a.sql"]);
        let report = validate_structure(&up, &down);
        let invalid_orders = report
            .issues()
            .iter()
            .filter(|i| matches!(i, ValidationIssue::InvalidOrder { .. }))
            .count();
        assert_eq!(invalid_orders, 2);
    }

    #[test]
    fn test_multiple_issue_kinds_collected_together() {
        let up = names(&["1-a.sql", "x-b.sql", "5-c.sql"]);
        let down = names(&["1-a.sql", "2-b.sql"]);
        let report = validate_structure(&up, &down);
        assert!(report.len() >= 3, "expected several issues, got: {report}");
        assert!(report
            .issues()
            .iter()
            .any(|i| matches!(i, ValidationIssue::CountMismatch { .. })));
        assert!(report
            .issues()
            .iter()
            .any(|i| matches!(i, ValidationIssue::InvalidName { .. })));
        assert!(report
            .issues()
            .iter()
            .any(|i| matches!(i, ValidationIssue::Gap { .. })));
    }

    #[test]
    fn test_check_sequence_gap_and_duplicate() {
        let issues = check_sequence(vec![(1, "1-a.sql"), (3, "3-c.sql"), (3, "3-d.sql")]);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::Gap {
                    expected: 2,
                    found: 3,
                    name: "3-c.sql".to_string()
                },
                ValidationIssue::DuplicateOrder {
                    order: 3,
                    name: "3-d.sql".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_check_sequence_must_start_at_one() {
        let issues = check_sequence(vec![(2, "2-b.sql")]);
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], ValidationIssue::Gap { expected: 1, found: 2, .. }));
    }

    #[test]
    fn test_double_digit_orders_are_dense() {
        let list: Vec<String> = (1..=12).map(|i| format!("{i}-step.sql")).collect();
        let report = validate_structure(&list, &list);
        assert!(report.is_empty(), "unexpected issues: {report}");
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationReport::default().into_result().is_ok());
        let err = ValidationReport::new(vec![ValidationIssue::CountMismatch { up: 1, down: 0 }])
            .into_result()
            .unwrap_err();
        assert!(matches!(err, MigrationError::Validation(_)));
    }
}
