//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`Timer24hError`] via `#[from]`. Adapters box their source errors into
//! [`Timer24hError::Storage`].

/// Top-level error returned by domain validation and application use-cases.
#[derive(Debug, thiserror::Error)]
pub enum Timer24hError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("actuation error: {0}")]
    Actuation(#[from] ActuationError),

    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated while constructing a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("schedule id cannot be empty")]
    EmptyScheduleId,

    #[error("target entity id cannot be empty")]
    EmptyTargetEntityId,

    #[error("condition entity id cannot be empty")]
    EmptyConditionEntityId,

    #[error("schedule must have exactly {expected} slots, got {actual}")]
    SlotCount { expected: usize, actual: usize },

    #[error("invalid policy: {0}")]
    UnknownPolicy(String),

    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("schedule stored under key {key} has id {schedule_id}")]
    ScheduleIdMismatch { key: String, schedule_id: String },

    #[error("preview horizon must be between 1 and 168 hours, got {0}")]
    PreviewHours(u32),
}

/// An operation referenced something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    /// Shorthand for a missing schedule.
    #[must_use]
    pub fn schedule(id: impl Into<String>) -> Self {
        Self {
            entity: "Schedule",
            id: id.into(),
        }
    }
}

/// The host refused or failed to change an entity's power state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActuationError {
    #[error("target entity {0} not found")]
    UnknownEntity(String),

    #[error("{entity_id} rejected the command: {reason}")]
    Rejected { entity_id: String, reason: String },
}
