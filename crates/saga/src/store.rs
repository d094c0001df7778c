//! Saga state store abstraction.

use async_trait::async_trait;
use common::SagaId;

use crate::error::Result;
use crate::record::SagaState;
use crate::state::SagaStatus;

/// Append-only log of saga transitions, keyed by saga id.
///
/// Implementations must allow concurrent writes for different saga ids.
/// Writes for one saga id are serialized by the orchestrator that owns it.
#[async_trait]
pub trait SagaStateStore: Send + Sync {
    /// Begins tracking `saga_id` with status `Started` and a single log entry.
    ///
    /// Fails with `SagaError::AlreadyStarted` if the id is already tracked.
    async fn start(&self, saga_id: SagaId) -> Result<()>;

    /// Moves the saga to `status` and appends one log entry.
    ///
    /// Fails with `SagaError::NotFound` for unknown ids and
    /// `SagaError::InvalidTransition` if the status change is illegal.
    async fn record(
        &self,
        saga_id: SagaId,
        status: SagaStatus,
        step_name: &str,
        message: Option<&str>,
    ) -> Result<()>;

    /// Returns a snapshot of the saga, or `None` if it is not tracked.
    async fn get(&self, saga_id: SagaId) -> Option<SagaState>;

    /// Returns the number of tracked sagas.
    async fn count(&self) -> usize;
}
