//! Error types shared by the repository and the validation layer.

use thiserror::Error;

/// Rejections raised at the entity construction / update boundary.
///
/// The priority calculator and the statistics aggregator assume valid
/// input, so everything they rely on is checked here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("subject name must not be empty")]
    EmptySubjectName,

    #[error("invalid color '{0}', expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("difficulty must be between 1 and 5, got {0}")]
    DifficultyOutOfRange(i64),

    #[error("difficulty must be a whole number from 1 to 5, got '{0}'")]
    InvalidDifficulty(String),

    #[error("estimated time must be a positive number of minutes")]
    NonPositiveEstimate,

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("unknown task type '{0}' (homework, exam, project)")]
    UnknownTaskType(String),

    #[error("unknown status '{0}' (open, in_progress, done)")]
    UnknownStatus(String),

    #[error("subject '{0}' does not exist")]
    UnknownSubject(String),
}

/// Which collection a lookup ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Subject,
    Task,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Subject => f.write_str("subject"),
            EntityKind::Task    => f.write_str("task"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("'{prefix}' matches more than one {kind}")]
    AmbiguousId { kind: EntityKind, prefix: String },

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("stored data for '{key}' is malformed: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PlannerError {
    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        PlannerError::NotFound { kind, id: id.to_owned() }
    }
}

pub type PlannerResult<T> = Result<T, PlannerError>;
