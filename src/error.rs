//! Error types.
//!
//! Each layer has its own enum so callers can match on what went wrong
//! without string inspection. `EngineError` is what the batch entry
//! points return; per-class failures never reach it (they are folded into
//! the run summary) except for [`TrackerError`], which signals a bug.

use std::path::PathBuf;

use crate::models::{ClassId, Slot, SubjectId, TeacherId};
use crate::validation::ValidationError;

/// Rejected calendar configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("Invalid calendar configuration: {0}")]
    InvalidConfig(String),
}

/// Failure to obtain a usable catalog snapshot.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog source unavailable: {0}")]
    Unavailable(String),

    #[error("Catalog failed validation ({} problem(s))", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// Misuse of the availability tracker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    #[error("Double booking attempt: teacher {teacher} is already committed at {slot} (held by class {holder})")]
    DoubleBookingAttempt {
        teacher: TeacherId,
        slot: Slot,
        holder: ClassId,
    },
}

/// Why a single class could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("Required {required} weekly hours exceed the {available} regular slots of the week")]
    CapacityExceeded { required: u32, available: u32 },

    #[error("No eligible teacher could take any period of: {}", join_ids(.subjects))]
    NoEligibleTeacher { subjects: Vec<SubjectId> },

    #[error("Catalog has no teacher for: {}", join_ids(.subjects))]
    CatalogIncomplete { subjects: Vec<SubjectId> },

    #[error(transparent)]
    DoubleBooking(#[from] TrackerError),
}

/// Error type for repository operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failure to load an engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error("Invalid scheduling policy: {0}")]
    Policy(String),
}

/// Errors that abort a whole batch operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

fn join_ids(ids: &[SubjectId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
