use thiserror::Error;

use crate::core::types::{ConflictId, ModifierId, OperationId, Side, SubUnitId, TheaterId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict not found: {0}")]
    ConflictNotFound(ConflictId),

    #[error("Theater {theater} not found in conflict {conflict}")]
    TheaterNotFound {
        conflict: ConflictId,
        theater: TheaterId,
    },

    #[error("Sub-unit {unit} not found on the {side} side")]
    SubUnitNotFound { side: Side, unit: SubUnitId },

    #[error("Modifier {modifier} not found on the {side} side")]
    ModifierNotFound { side: Side, modifier: ModifierId },

    #[error("Operation not found: {0}")]
    OperationNotFound(OperationId),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Shorthand for a validation failure
pub(crate) fn invalid<T>(message: impl Into<String>) -> Result<T> {
    Err(EngineError::Validation(message.into()))
}
