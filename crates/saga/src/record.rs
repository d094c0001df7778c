//! Audit records and state snapshots.

use chrono::{DateTime, Utc};
use common::SagaId;
use serde::{Deserialize, Serialize};

use crate::state::SagaStatus;

/// One entry in a saga's audit log. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaStep {
    /// The participant that produced the entry ("Saga", "Inventory", ...).
    pub name: String,
    /// The status the saga moved to with this entry.
    pub status: SagaStatus,
    /// When the transition was recorded.
    pub occurred_at: DateTime<Utc>,
    /// Human-readable detail, e.g. a failure reason.
    pub message: Option<String>,
}

impl SagaStep {
    /// Creates an entry stamped with the current time.
    pub fn new(name: impl Into<String>, status: SagaStatus, message: Option<&str>) -> Self {
        Self {
            name: name.into(),
            status,
            occurred_at: Utc::now(),
            message: message.map(str::to_owned),
        }
    }
}

/// Point-in-time copy of a saga's status and audit log.
///
/// Steps are in insertion order, which is also the causal order since
/// one orchestrator flow drives each saga.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaState {
    saga_id: SagaId,
    status: SagaStatus,
    steps: Vec<SagaStep>,
}

impl SagaState {
    pub(crate) fn new(saga_id: SagaId, status: SagaStatus, steps: Vec<SagaStep>) -> Self {
        Self {
            saga_id,
            status,
            steps,
        }
    }

    /// Returns the saga ID.
    pub fn saga_id(&self) -> SagaId {
        self.saga_id
    }

    /// Returns the latest status.
    pub fn status(&self) -> SagaStatus {
        self.status
    }

    /// Returns the audit log.
    pub fn steps(&self) -> &[SagaStep] {
        &self.steps
    }

    /// Returns the status recorded by each log entry, in order.
    pub fn statuses(&self) -> Vec<SagaStatus> {
        self.steps.iter().map(|step| step.status).collect()
    }

    /// Returns true once the saga has reached `Completed` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_new_sets_fields() {
        let before = Utc::now();
        let step = SagaStep::new("Inventory", SagaStatus::InventoryReserved, Some("Reserved stock"));

        assert_eq!(step.name, "Inventory");
        assert_eq!(step.status, SagaStatus::InventoryReserved);
        assert_eq!(step.message.as_deref(), Some("Reserved stock"));
        assert!(step.occurred_at >= before);
    }

    #[test]
    fn test_state_accessors() {
        let saga_id = SagaId::new();
        let state = SagaState::new(
            saga_id,
            SagaStatus::Completed,
            vec![
                SagaStep::new("Saga", SagaStatus::Started, None),
                SagaStep::new("Saga", SagaStatus::Completed, None),
            ],
        );

        assert_eq!(state.saga_id(), saga_id);
        assert_eq!(state.status(), SagaStatus::Completed);
        assert_eq!(
            state.statuses(),
            vec![SagaStatus::Started, SagaStatus::Completed]
        );
        assert!(state.is_terminal());
    }

    #[test]
    fn test_state_serialization() {
        let state = SagaState::new(
            SagaId::new(),
            SagaStatus::Started,
            vec![SagaStep::new("Saga", SagaStatus::Started, Some("Saga started"))],
        );

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "Started");
        assert_eq!(json["steps"][0]["name"], "Saga");
        assert_eq!(json["steps"][0]["message"], "Saga started");
    }
}
