//! Inventory step: reserve and release stock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StepClient, simulate_latency};
use crate::cancellation::Cancellation;
use crate::error::StepError;
use crate::order_fulfillment::STEP_INVENTORY;

/// Units of one product to hold for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReservation {
    /// Product code (SKU).
    pub product_code: String,
    /// Units to reserve or release.
    pub quantity: u32,
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    reserved: HashMap<String, u32>,
    fail_on_reserve: bool,
    fail_on_release: bool,
}

/// In-memory inventory step for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStep {
    state: Arc<RwLock<InMemoryInventoryState>>,
    latency: Duration,
}

impl InMemoryInventoryStep {
    /// Creates a new in-memory inventory step.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Configures the step to fail on reserve.
    pub async fn set_fail_on_reserve(&self, fail: bool) {
        self.state.write().await.fail_on_reserve = fail;
    }

    /// Configures the step to fail on release.
    pub async fn set_fail_on_release(&self, fail: bool) {
        self.state.write().await.fail_on_release = fail;
    }

    /// Returns the units currently reserved for `product_code`.
    pub async fn reserved_units(&self, product_code: &str) -> u32 {
        self.state
            .read()
            .await
            .reserved
            .get(product_code)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the number of products with units on hold.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reserved.len()
    }
}

#[async_trait]
impl StepClient for InMemoryInventoryStep {
    type Input = StockReservation;

    fn name(&self) -> &'static str {
        STEP_INVENTORY
    }

    async fn forward(
        &self,
        input: &StockReservation,
        cancellation: &Cancellation,
    ) -> Result<(), StepError> {
        simulate_latency(STEP_INVENTORY, self.latency, cancellation).await?;
        let mut state = self.state.write().await;

        if state.fail_on_reserve {
            return Err(StepError::execution(STEP_INVENTORY, "Insufficient stock"));
        }

        let units = state
            .reserved
            .entry(input.product_code.clone())
            .or_default();
        *units = units.saturating_add(input.quantity);
        tracing::debug!(
            product_code = %input.product_code,
            quantity = input.quantity,
            "stock reserved"
        );
        Ok(())
    }

    async fn compensate(
        &self,
        input: &StockReservation,
        cancellation: &Cancellation,
    ) -> Result<(), StepError> {
        simulate_latency(STEP_INVENTORY, self.latency, cancellation)
            .await
            .map_err(|e| StepError::compensation(STEP_INVENTORY, e.to_string()))?;
        let mut state = self.state.write().await;

        if state.fail_on_release {
            return Err(StepError::compensation(
                STEP_INVENTORY,
                "Inventory service unavailable",
            ));
        }

        if let Some(units) = state.reserved.get_mut(&input.product_code) {
            *units = units.saturating_sub(input.quantity);
            if *units == 0 {
                state.reserved.remove(&input.product_code);
            }
        }
        tracing::debug!(
            product_code = %input.product_code,
            quantity = input.quantity,
            "stock released"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(code: &str, quantity: u32) -> StockReservation {
        StockReservation {
            product_code: code.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_reserve_and_release() {
        let step = InMemoryInventoryStep::new();
        let never = Cancellation::never();
        let input = reservation("SKU-001", 2);

        step.forward(&input, &never).await.unwrap();
        assert_eq!(step.reserved_units("SKU-001").await, 2);
        assert_eq!(step.reservation_count().await, 1);

        step.compensate(&input, &never).await.unwrap();
        assert_eq!(step.reserved_units("SKU-001").await, 0);
        assert_eq!(step.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn test_reservations_accumulate_per_product() {
        let step = InMemoryInventoryStep::new();
        let never = Cancellation::never();

        step.forward(&reservation("SKU-001", 2), &never).await.unwrap();
        step.forward(&reservation("SKU-001", 3), &never).await.unwrap();
        step.forward(&reservation("SKU-002", 1), &never).await.unwrap();
        step.compensate(&reservation("SKU-001", 2), &never)
            .await
            .unwrap();

        assert_eq!(step.reserved_units("SKU-001").await, 3);
        assert_eq!(step.reserved_units("SKU-002").await, 1);
    }

    #[tokio::test]
    async fn test_release_never_goes_below_zero() {
        let step = InMemoryInventoryStep::new();
        let never = Cancellation::never();

        step.compensate(&reservation("SKU-404", 5), &never)
            .await
            .unwrap();
        assert_eq!(step.reserved_units("SKU-404").await, 0);
    }

    #[tokio::test]
    async fn test_fail_on_reserve() {
        let step = InMemoryInventoryStep::new();
        step.set_fail_on_reserve(true).await;

        let result = step
            .forward(&reservation("SKU-001", 2), &Cancellation::never())
            .await;
        assert!(matches!(result, Err(StepError::Execution { .. })));
        assert_eq!(step.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn test_fail_on_release_keeps_reservation() {
        let step = InMemoryInventoryStep::new();
        let never = Cancellation::never();
        let input = reservation("SKU-001", 2);
        step.forward(&input, &never).await.unwrap();
        step.set_fail_on_release(true).await;

        let result = step.compensate(&input, &never).await;
        assert!(matches!(result, Err(StepError::Compensation { .. })));
        assert_eq!(step.reserved_units("SKU-001").await, 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_reserve() {
        let step = InMemoryInventoryStep::new();
        let handle = crate::cancellation::CancellationHandle::new();
        handle.cancel();

        let result = step
            .forward(&reservation("SKU-001", 2), &handle.token())
            .await;
        assert_eq!(result, Err(StepError::cancelled(STEP_INVENTORY)));
        assert_eq!(step.reservation_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let step = InMemoryInventoryStep::new().with_latency(Duration::from_millis(250));
        let started = tokio::time::Instant::now();

        step.forward(&reservation("SKU-001", 1), &Cancellation::never())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
