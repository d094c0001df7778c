//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The status of a saga instance.
///
/// State transitions:
/// ```text
/// Started ──► InventoryReserved ──► PaymentCharged ──► Completed
///    │               │                    │
///    └───────────────┴────────────────────┴──► Compensating ──► Compensated ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaStatus {
    /// Tracking has begun; no forward step has completed yet.
    #[default]
    Started,

    /// Stock for the order is held.
    InventoryReserved,

    /// Payment for the order has been captured.
    PaymentCharged,

    /// All forward steps succeeded (terminal state).
    Completed,

    /// A forward step failed and completed steps are being undone.
    Compensating,

    /// Compensating actions have run.
    Compensated,

    /// The saga finished after compensation (terminal state).
    Failed,
}

impl SagaStatus {
    /// Returns true if `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: SagaStatus) -> bool {
        use SagaStatus::*;

        matches!(
            (*self, next),
            (Started, InventoryReserved)
                | (InventoryReserved, PaymentCharged)
                | (PaymentCharged, Completed)
                | (Started | InventoryReserved | PaymentCharged, Compensating)
                | (Compensating, Compensated)
                | (Compensated, Failed)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaStatus::Completed | SagaStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStatus::Started => "Started",
            SagaStatus::InventoryReserved => "InventoryReserved",
            SagaStatus::PaymentCharged => "PaymentCharged",
            SagaStatus::Completed => "Completed",
            SagaStatus::Compensating => "Compensating",
            SagaStatus::Compensated => "Compensated",
            SagaStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
