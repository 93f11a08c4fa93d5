//! Serializable point-in-time views of coordinator state.
//!
//! Failure reports and structured logs want to say what the harness believed
//! when something went wrong: which test was running, which mocks were
//! registered, how far each slot's budget had been spent, what phase the
//! session was in. Snapshots carry exactly that as plain data; capturing one
//! mutates nothing.

use serde::Serialize;

use crate::coordinator::TestRunCoordinator;
use crate::registry::{MockRegistration, MockScope, SlotPolicy};
use crate::session::{RecordReplaySession, SessionPhase};

/// One behavior slot's bookkeeping at capture time.
#[derive(Debug, Clone, Serialize)]
pub struct SlotSnapshot {
    pub policy: SlotPolicy,
    pub active: bool,
    pub matched: u64,
}

/// One live mock registration at capture time.
#[derive(Debug, Clone, Serialize)]
pub struct MockRegistrationSnapshot {
    pub mock_impl: String,
    pub instance: Option<u64>,
    pub scope: MockScope,
    pub slots: Vec<SlotSnapshot>,
}

impl MockRegistrationSnapshot {
    fn capture(registration: &MockRegistration) -> Self {
        Self {
            mock_impl: registration.mock_impl().name().to_string(),
            instance: registration.instance().map(|id| id.raw()),
            scope: registration.scope(),
            slots: registration
                .states()
                .iter()
                .map(|slot| SlotSnapshot {
                    policy: slot.policy(),
                    active: slot.is_active(),
                    matched: slot.matched_count(),
                })
                .collect(),
        }
    }
}

/// The running test's session at capture time.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub test_id: u64,
    pub phase: SessionPhase,
    pub declared_expectations: usize,
    pub observed_invocations: usize,
}

impl SessionSnapshot {
    fn capture(session: &RecordReplaySession) -> Self {
        Self {
            test_id: session.test_id(),
            phase: session.phase(),
            declared_expectations: session.declared().len(),
            observed_invocations: session.observed().len(),
        }
    }
}

/// Everything a failure report needs about the coordinator, as plain data.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorSnapshot {
    pub test_id: u64,
    pub test_class: Option<String>,
    pub session: Option<SessionSnapshot>,
    pub mocks: Vec<MockRegistrationSnapshot>,
    pub threads_inside_no_mocking_zone: usize,
}

impl CoordinatorSnapshot {
    /// Captures the coordinator's current state.
    ///
    /// Takes the session lock briefly; do not call while holding a
    /// [`SessionGuard`](crate::session::SessionGuard) on the same
    /// coordinator.
    pub fn capture(coordinator: &TestRunCoordinator) -> Self {
        Self {
            test_id: coordinator.test_id(),
            test_class: coordinator
                .current_test_class()
                .map(|class| class.name().to_string()),
            session: coordinator
                .record_replay_for_running_test()
                .map(|session| SessionSnapshot::capture(&session)),
            mocks: coordinator
                .registry()
                .registrations()
                .iter()
                .map(|registration| MockRegistrationSnapshot::capture(registration))
                .collect(),
            threads_inside_no_mocking_zone: coordinator.zone_tracker().threads_inside(),
        }
    }
}
