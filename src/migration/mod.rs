//! Migration discovery and range resolution.
//!
//! This module turns a directory of paired SQL scripts into an ordered,
//! validated [`MigrationSet`] and answers which steps move a database from
//! one schema version to another.
//!
//! # Overview
//!
//! - Scripts live in `<root>/up/N-slug.sql` and `<root>/down/N-slug.sql`
//! - [`FsMigrationProvider`] reads and validates the directory on every call
//! - Validation collects every naming, count, pairing and sequence problem
//!   into a single [`ValidationReport`]
//! - [`MigrationSet::resolve`] returns the steps in execution order: ascending
//!   when moving up, most recently applied first when moving down
//!
//! # Usage
//!
//! ```ignore
//! let provider = FsMigrationProvider::new("./migrations");
//! let plan = provider.resolve(current_version, target_version).await?;
//! for step in &plan.steps {
//!     backend.execute(step.script(plan.direction)).await?;
//! }
//! ```

mod discovery;
pub mod naming;
mod set;
mod types;
pub mod validation;

pub use discovery::FsMigrationProvider;
pub use naming::{is_valid_migration_name, parse_order_number, OrderNumberError};
pub use set::MigrationSet;
pub use types::{MigrationDirection, MigrationError, MigrationPlan, MigrationRecord, MigrationSource};
pub use validation::{ValidationIssue, ValidationReport};
