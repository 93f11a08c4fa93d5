use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::callsite::{CallSiteKey, InstanceId, MockImplId, TypeName};
use crate::diagnostics::CoordinatorSnapshot;
use crate::error::{HarnessError, Result};
use crate::registry::{FieldTypeRedefinitions, MockHandle, MockRegistry};
use crate::session::{ExecutingTestContext, SessionGuard};

use super::zone::{NoMockingZoneGuard, NoMockingZoneTracker};

/// Type-erased handle to the live test fixture instance.
pub type FixtureHandle = Arc<dyn Any + Send + Sync>;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// The per-test-run state coordinator.
///
/// One explicitly constructed instance owns everything that is scoped to
/// "the currently running test": the mock registry, the record/replay
/// session, the field-type redefinitions, and the per-thread no-mocking
/// zones. Embedders share it as `Arc<TestRunCoordinator>` between the
/// rewriting engine's hook and the test-framework adapter; there is no
/// hidden global.
///
/// Rewritten call sites hit two entry points: [`get_mock`](Self::get_mock)
/// resolves which mock services a call, and
/// [`update_mock_state`](Self::update_mock_state) decides whether the call
/// is intercepted at all. Both check the calling thread's no-mocking zone
/// before touching any other state.
#[derive(Default)]
pub struct TestRunCoordinator {
    test_id: AtomicU64,
    current_test_class: RwLock<Option<TypeName>>,
    current_test_instance: RwLock<Option<FixtureHandle>>,
    redefinitions: RwLock<Option<Arc<FieldTypeRedefinitions>>>,
    registry: MockRegistry,
    executing: ExecutingTestContext,
    zones: NoMockingZoneTracker,
}

impl TestRunCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity of the test currently executing (diagnostics only).
    pub fn test_id(&self) -> u64 {
        self.test_id.load(Ordering::Relaxed)
    }

    /// Resets per-test state before the next test starts and returns the new
    /// test identity.
    ///
    /// This is the authoritative reset between tests: the previous test's
    /// record/replay session and its test-scoped mock registrations are
    /// discarded here, so nothing of them can leak into the next test.
    /// Suite-scoped registrations survive.
    #[tracing::instrument(skip_all)]
    pub fn prepare_for_next_test(&self) -> u64 {
        let test_id = self.test_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.executing.discard_session();
        self.registry.discard_test_scoped();
        debug!(test_id, "prepared for next test");
        test_id
    }

    /// Sets or clears the class under test.
    pub fn set_current_test_class(&self, test_class: Option<TypeName>) {
        *write(&self.current_test_class) = test_class;
    }

    pub fn current_test_class(&self) -> Option<TypeName> {
        read(&self.current_test_class).clone()
    }

    /// Sets or clears the live fixture instance of the test presently
    /// executing. Callers clear it at teardown; nothing expires it.
    pub fn set_running_individual_test(&self, fixture: Option<FixtureHandle>) {
        *write(&self.current_test_instance) = fixture;
    }

    pub fn current_test_instance(&self) -> Option<FixtureHandle> {
        read(&self.current_test_instance).clone()
    }

    /// Installs the field-type redefinitions for the current test, replacing
    /// any previous set. `None` means no field-level mocking is active, which
    /// also makes [`record_replay_for_verifications`](Self::record_replay_for_verifications)
    /// unusable.
    pub fn set_field_type_redefinitions(&self, redefinitions: Option<FieldTypeRedefinitions>) {
        *write(&self.redefinitions) = redefinitions.map(Arc::new);
    }

    pub fn field_type_redefinitions(&self) -> Option<Arc<FieldTypeRedefinitions>> {
        read(&self.redefinitions).clone()
    }

    /// Builds the mock instance for a redefined field type, or `None` when
    /// the type is not redefined for the current test.
    ///
    /// The factory runs inside a no-mocking zone: materialization is harness
    /// machinery and must not itself be intercepted.
    pub fn materialize_redefined(&self, target: &TypeName) -> Option<MockHandle> {
        let redefinitions = read(&self.redefinitions).clone()?;
        let _zone = self.zones.enter_scoped();
        redefinitions.materialize(target)
    }

    /// Marks the current test's session as finished and releases its
    /// bookkeeping. No-op when no session exists; idempotent.
    #[tracing::instrument(skip_all)]
    pub fn finish_current_test_execution(&self) {
        self.executing.finish_execution();
    }

    /// Resolves the mock servicing a rewritten call, or `None` to fall
    /// through to the original behavior. Inside a no-mocking zone the answer
    /// is always `None`.
    pub fn get_mock(
        &self,
        mock_impl: &MockImplId,
        instance: Option<InstanceId>,
    ) -> Option<MockHandle> {
        if self.zones.is_inside() {
            return None;
        }
        self.registry.get_mock(mock_impl, instance)
    }

    /// Decides whether the call at `site` gets intercepted, updating the
    /// governing slot's bookkeeping when it does. Inside a no-mocking zone
    /// the answer is always `false`.
    ///
    /// # Panics
    ///
    /// Panics when the site's slot index is beyond the registered slot
    /// table; [`MockRegistry::validate_call_sites`] catches that drift at
    /// setup time instead.
    pub fn update_mock_state(&self, site: &CallSiteKey) -> bool {
        if self.zones.is_inside() {
            return false;
        }
        self.registry
            .update_mock_state(site.mock_impl(), site.instance(), site.slot_index())
    }

    /// The current test's session, if one exists. Never creates one.
    pub fn record_replay_for_running_test(&self) -> Option<SessionGuard<'_>> {
        self.executing.current()
    }

    /// The current test's session, created in its recording phase on first
    /// use. Idempotent within a test.
    pub fn get_or_create_record_replay(&self) -> SessionGuard<'_> {
        self.executing.get_or_create(self.test_id())
    }

    /// The current test's session, moved forward into its verification
    /// phase.
    ///
    /// Requires field-type redefinitions to be set for the current test and
    /// a live session to verify against; failing either requirement is a
    /// usage error and mutates nothing.
    pub fn record_replay_for_verifications(&self) -> Result<SessionGuard<'_>> {
        if read(&self.redefinitions).is_none() {
            return Err(HarnessError::VerifyWithoutMockingContext);
        }
        let mut session = self
            .executing
            .current()
            .ok_or(HarnessError::NoSessionToVerify)?;
        session.begin_verification()?;
        Ok(session)
    }

    /// Enters a no-mocking zone on the calling thread for the life of the
    /// returned guard.
    pub fn no_mocking_zone(&self) -> NoMockingZoneGuard<'_> {
        self.zones.enter_scoped()
    }

    pub fn zone_tracker(&self) -> &NoMockingZoneTracker {
        &self.zones
    }

    pub fn registry(&self) -> &MockRegistry {
        &self.registry
    }

    /// A serializable point-in-time view of the coordinator, for failure
    /// reports and structured logs.
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot::capture(self)
    }
}
