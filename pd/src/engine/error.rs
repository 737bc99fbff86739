//! Engine error kinds
//!
//! Every rejected action yields a specific kind; there is no silent no-op
//! disguised as success (the one defined exception being the idempotent
//! double close, which succeeds).

use thiserror::Error;

/// Caller-facing errors from engine operations.
///
/// Validation errors leave the planning untouched. `Busy` is retryable by
/// the caller. `Persistence` means the durable write failed and the
/// in-memory mutation was rolled back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("planning not found: {0}")]
    NotFound(String),

    #[error("a planning needs at least one option")]
    EmptyOptionSet,

    #[error("duplicate option label: {0}")]
    DuplicateLabel(String),

    #[error("planning {planning} has no option {option}")]
    UnknownOption { planning: String, option: u32 },

    #[error("planning {0} is closed")]
    PlanningClosed(String),

    #[error("only the creator can close planning {0}")]
    NotAuthorized(String),

    #[error("planning {0} is busy, retry later")]
    Busy(String),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

/// Result alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
