#![allow(dead_code)]
//! Shared fixtures for the coordinator integration tests.

use std::sync::Arc;

use mockrun::{InstanceId, MockHandle, MockImplId, MockScope, SlotPolicy, TestRunCoordinator};

pub use mockrun_testkit::init_test_logging;

/// Sample mock object: a clock pinned to one instant.
pub struct FrozenClock {
    pub now: u64,
}

/// Sample mock object with no behavior of its own.
pub struct AuditLogMock;

/// A fresh coordinator with test logging installed.
pub fn coordinator() -> Arc<TestRunCoordinator> {
    init_test_logging();
    Arc::new(TestRunCoordinator::new())
}

/// Registers a type-scoped mock whose slots all use the given policies.
pub fn register(
    coordinator: &TestRunCoordinator,
    name: &str,
    instance: Option<InstanceId>,
    policies: impl IntoIterator<Item = SlotPolicy>,
    scope: MockScope,
) -> MockImplId {
    let mock_impl = MockImplId::new(name);
    coordinator
        .registry()
        .register(
            mock_impl.clone(),
            instance,
            MockHandle::new(AuditLogMock),
            policies,
            scope,
        )
        .expect("registration key is fresh");
    mock_impl
}
