//! Saga error types.

use common::SagaId;
use thiserror::Error;

use crate::state::SagaStatus;

/// Errors that cross the orchestrator or store boundary.
///
/// Step failures are not in here: the orchestrator turns them into
/// state transitions instead of returning them.
#[derive(Debug, Error)]
pub enum SagaError {
    /// A saga with this id is already being tracked.
    #[error("Saga has already been started: {0}")]
    AlreadyStarted(SagaId),

    /// No saga with this id is being tracked.
    #[error("Saga not found: {0}")]
    NotFound(SagaId),

    /// The requested status change is not an edge of the saga state machine.
    #[error("Invalid transition for saga {saga_id}: {from} -> {to}")]
    InvalidTransition {
        saga_id: SagaId,
        from: SagaStatus,
        to: SagaStatus,
    },

    /// The request failed validation before any state was created.
    #[error("Invalid saga request: {0}")]
    InvalidRequest(String),
}

/// Failure of a single step client call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// A forward action failed.
    #[error("{step} step failed: {reason}")]
    Execution { step: String, reason: String },

    /// A compensating action failed.
    #[error("{step} compensation failed: {reason}")]
    Compensation { step: String, reason: String },

    /// The call was abandoned because the saga was cancelled.
    #[error("{step} step cancelled")]
    Cancelled { step: String },
}

impl StepError {
    /// Creates an execution failure for `step`.
    pub fn execution(step: impl Into<String>, reason: impl Into<String>) -> Self {
        StepError::Execution {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Creates a compensation failure for `step`.
    pub fn compensation(step: impl Into<String>, reason: impl Into<String>) -> Self {
        StepError::Compensation {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cancellation failure for `step`.
    pub fn cancelled(step: impl Into<String>) -> Self {
        StepError::Cancelled { step: step.into() }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
