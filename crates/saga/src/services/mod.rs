//! Step client trait and in-memory step implementations.

pub mod inventory;
pub mod payment;

use std::time::Duration;

use async_trait::async_trait;

pub use inventory::{InMemoryInventoryStep, StockReservation};
pub use payment::{InMemoryPaymentStep, PaymentCharge};

use crate::cancellation::Cancellation;
use crate::error::StepError;

/// One participant in a saga: a forward action and its compensating action.
///
/// Neither call retries. Callers that need a deadline wrap the call in a
/// timeout themselves.
#[async_trait]
pub trait StepClient: Send + Sync {
    /// Input shared by the forward and compensating actions.
    type Input: Send + Sync;

    /// Name used in log entries and errors.
    fn name(&self) -> &'static str;

    /// Performs the step. Fails with `StepError::Execution` or `StepError::Cancelled`.
    async fn forward(
        &self,
        input: &Self::Input,
        cancellation: &Cancellation,
    ) -> Result<(), StepError>;

    /// Undoes a completed step. Fails with `StepError::Compensation`.
    async fn compensate(
        &self,
        input: &Self::Input,
        cancellation: &Cancellation,
    ) -> Result<(), StepError>;
}

/// Waits out the configured latency standing in for a network round trip.
async fn simulate_latency(
    step: &'static str,
    latency: Duration,
    cancellation: &Cancellation,
) -> Result<(), StepError> {
    if cancellation.is_cancelled() {
        return Err(StepError::cancelled(step));
    }
    if latency.is_zero() {
        return Ok(());
    }
    cancellation
        .run_until_cancelled(tokio::time::sleep(latency))
        .await
        .ok_or_else(|| StepError::cancelled(step))
}
