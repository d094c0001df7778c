//! Payment step: charge and refund.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::Money;
use tokio::sync::RwLock;

use super::{StepClient, simulate_latency};
use crate::cancellation::Cancellation;
use crate::error::StepError;
use crate::order_fulfillment::STEP_PAYMENT;

/// An amount to capture for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentCharge {
    /// Amount to charge or refund.
    pub amount: Money,
    /// When set, the charge always fails.
    pub simulate_failure: bool,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    captured: Money,
    charges: usize,
    fail_on_refund: bool,
}

/// In-memory payment step for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentStep {
    state: Arc<RwLock<InMemoryPaymentState>>,
    latency: Duration,
}

impl InMemoryPaymentStep {
    /// Creates a new in-memory payment step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Configures the step to fail on refund.
    pub async fn set_fail_on_refund(&self, fail: bool) {
        self.state.write().await.fail_on_refund = fail;
    }

    /// Returns the number of charges not yet refunded.
    pub async fn charge_count(&self) -> usize {
        self.state.read().await.charges
    }

    /// Returns the total captured and not yet refunded.
    pub async fn captured_total(&self) -> Money {
        self.state.read().await.captured
    }
}

#[async_trait]
impl StepClient for InMemoryPaymentStep {
    type Input = PaymentCharge;

    fn name(&self) -> &'static str {
        STEP_PAYMENT
    }

    async fn forward(
        &self,
        input: &PaymentCharge,
        cancellation: &Cancellation,
    ) -> Result<(), StepError> {
        simulate_latency(STEP_PAYMENT, self.latency, cancellation).await?;

        if input.simulate_failure {
            return Err(StepError::execution(
                STEP_PAYMENT,
                "Simulated payment failure",
            ));
        }

        let mut state = self.state.write().await;
        state.captured = state.captured.checked_add(input.amount).ok_or_else(|| {
            StepError::execution(STEP_PAYMENT, "Charge exceeds capture limit")
        })?;
        state.charges += 1;
        tracing::debug!(amount = %input.amount, "payment charged");
        Ok(())
    }

    async fn compensate(
        &self,
        input: &PaymentCharge,
        cancellation: &Cancellation,
    ) -> Result<(), StepError> {
        simulate_latency(STEP_PAYMENT, self.latency, cancellation)
            .await
            .map_err(|e| StepError::compensation(STEP_PAYMENT, e.to_string()))?;
        let mut state = self.state.write().await;

        if state.fail_on_refund {
            return Err(StepError::compensation(
                STEP_PAYMENT,
                "Payment provider unavailable",
            ));
        }

        if state.charges == 0 {
            return Ok(());
        }
        state.captured = state.captured.checked_sub(input.amount).ok_or_else(|| {
            StepError::compensation(STEP_PAYMENT, "Refund exceeds captured total")
        })?;
        state.charges -= 1;
        tracing::debug!(amount = %input.amount, "payment refunded");
        Ok(())
    }
}
