//! Device profile lifecycle and the one-time legacy key restructuring.

pub mod health;
pub mod restructure;
pub mod service;

use thiserror::Error;

use crate::error::{ProfileIntegrityFailure, StorageFailure};

pub use health::{health_report, ProfileHealth};
pub use restructure::{MigrationOutcome, MigrationService, MigrationStatus};
pub use service::{validate_profile, ProfileService, ProfileUpdate};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Storage(#[from] StorageFailure),

    #[error("no profile exists to update")]
    Missing,

    #[error(transparent)]
    Integrity(#[from] ProfileIntegrityFailure),
}
