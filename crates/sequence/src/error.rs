use thiserror::Error;
use uuid::Uuid;

use crate::types::StepKind;

pub type SequenceResult<T> = Result<T, SequenceError>;

/// Hard failures of sequence operations. Field-level problems are never
/// raised; they are returned as data by the validators.
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Invalid operation on {kind:?} step: {reason}")]
    InvalidOperation { kind: StepKind, reason: String },

    #[error("Invalid position {index}: {reason}")]
    InvalidPosition { index: usize, reason: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Allocation mismatch: {0}")]
    AllocationMismatch(String),

    #[error("Sequence is not ready for activation ({errors} error(s))")]
    NotReady { errors: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SequenceError {
    pub fn invalid_operation(kind: StepKind, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            kind,
            reason: reason.into(),
        }
    }

    pub fn invalid_position(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidPosition {
            index,
            reason: reason.into(),
        }
    }

    pub fn step_not_found(id: Uuid) -> Self {
        Self::NotFound { entity: "Step", id }
    }

    pub fn variant_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "Variant",
            id,
        }
    }

    pub fn allocation_mismatch(msg: impl Into<String>) -> Self {
        Self::AllocationMismatch(msg.into())
    }
}
