//! Order saga request type and step/message constants.

use common::Money;

use crate::error::{Result, SagaError};
use crate::services::{PaymentCharge, StockReservation};

/// Log entry name for saga-level transitions.
pub const STEP_SAGA: &str = "Saga";

/// Step name: reserve stock for the order.
pub const STEP_INVENTORY: &str = "Inventory";

/// Step name: capture payment for the order.
pub const STEP_PAYMENT: &str = "Payment";

/// Log entry name for the end of the compensation phase.
pub const STEP_COMPENSATION: &str = "Compensation";

pub const MSG_STARTED: &str = "Saga started";
pub const MSG_INVENTORY_RESERVED: &str = "Reserved stock";
pub const MSG_PAYMENT_CHARGED: &str = "Charged payment";
pub const MSG_COMPLETED: &str = "Order saga completed";
pub const MSG_FAILED: &str = "Completed with compensation";

/// Input for one run of the order saga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSagaRequest {
    /// Product to reserve.
    pub product_code: String,
    /// Units to reserve.
    pub quantity: u32,
    /// Amount to charge.
    pub amount: Money,
    /// Forces the payment step to fail, exercising compensation.
    pub simulate_failure: bool,
}

impl OrderSagaRequest {
    /// Creates a request that is expected to succeed.
    pub fn new(product_code: impl Into<String>, quantity: u32, amount: Money) -> Self {
        Self {
            product_code: product_code.into(),
            quantity,
            amount,
            simulate_failure: false,
        }
    }

    /// Sets the simulated payment failure flag.
    pub fn with_simulated_failure(mut self, simulate_failure: bool) -> Self {
        self.simulate_failure = simulate_failure;
        self
    }

    /// Checks field constraints before a saga is created.
    pub fn validate(&self) -> Result<()> {
        if self.product_code.trim().is_empty() {
            return Err(SagaError::InvalidRequest(
                "product_code must not be empty".to_string(),
            ));
        }
        if self.quantity == 0 {
            return Err(SagaError::InvalidRequest(
                "quantity must be positive".to_string(),
            ));
        }
        if self.amount.is_negative() {
            return Err(SagaError::InvalidRequest(
                "amount must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn reservation(&self) -> StockReservation {
        StockReservation {
            product_code: self.product_code.clone(),
            quantity: self.quantity,
        }
    }

    pub(crate) fn charge(&self) -> PaymentCharge {
        PaymentCharge {
            amount: self.amount,
            simulate_failure: self.simulate_failure,
        }
    }
}
