//! RAII test-lifecycle bracketing.

use std::sync::Arc;

use mockrun::{FieldTypeRedefinitions, FixtureHandle, TestRunCoordinator, TypeName};
use tracing::debug;

/// Brackets one test's lifetime against a coordinator, the way a
/// test-framework adapter would.
///
/// Construction performs the setup half: `prepare_for_next_test` plus
/// installing the current-test context. Drop performs teardown — finishing
/// the session and clearing the context — so the coordinator is left clean
/// even when the test body panics.
pub struct TestScope {
    coordinator: Arc<TestRunCoordinator>,
    test_id: u64,
}

impl TestScope {
    /// Starts a new test against `coordinator`.
    pub fn begin(coordinator: Arc<TestRunCoordinator>, test_class: &str) -> Self {
        let test_id = coordinator.prepare_for_next_test();
        coordinator.set_current_test_class(Some(TypeName::new(test_class)));
        debug!(test_id, test_class, "test scope opened");
        Self {
            coordinator,
            test_id,
        }
    }

    /// Installs the live fixture instance for this test.
    pub fn with_fixture(self, fixture: FixtureHandle) -> Self {
        self.coordinator.set_running_individual_test(Some(fixture));
        self
    }

    /// Installs field-type redefinitions for this test, enabling the
    /// verification APIs.
    pub fn with_redefinitions(self, redefinitions: FieldTypeRedefinitions) -> Self {
        self.coordinator
            .set_field_type_redefinitions(Some(redefinitions));
        self
    }

    /// The identity assigned to this test.
    pub fn test_id(&self) -> u64 {
        self.test_id
    }

    pub fn coordinator(&self) -> &Arc<TestRunCoordinator> {
        &self.coordinator
    }
}

impl Drop for TestScope {
    fn drop(&mut self) {
        self.coordinator.finish_current_test_execution();
        self.coordinator.set_running_individual_test(None);
        self.coordinator.set_current_test_class(None);
        self.coordinator.set_field_type_redefinitions(None);
        debug!(test_id = self.test_id, "test scope closed");
    }
}
