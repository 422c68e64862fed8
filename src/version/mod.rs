//! Service version support.
//!
//! The service version is a `major.minor.patch` triple stored next to the
//! schema version. It is only changed by explicit administrative calls and
//! never by the migration apply loop.

mod types;

pub use types::{SemVer, VersionError, VersionPart};
