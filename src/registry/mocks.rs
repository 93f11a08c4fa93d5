//! Mock registry and dispatcher.
//!
//! Maps (mock implementation, optional mocked instance) to live registration
//! data — the handle to the mock object and the slot table gating its
//! behaviors — and answers the two questions rewritten code asks on every
//! interceptable call: *which mock services this site* and *does this call
//! get intercepted*.
//!
//! Registration happens during test setup; replay is read-mostly, so the map
//! sits behind an `RwLock` and concurrent lookups never block each other.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::{debug, trace};

use crate::callsite::{CallSiteKey, InstanceId, MockImplId};
use crate::error::{HarnessError, Result};
use crate::registry::index::MockStateIndex;
use crate::registry::slot::SlotPolicy;

/// Cheaply cloneable, type-erased handle to a live mock object.
///
/// The coordinator never invokes mock behavior itself; it hands the object
/// back to the rewritten code, which downcasts to the concrete type it was
/// compiled against.
#[derive(Clone)]
pub struct MockHandle {
    object: Arc<dyn Any + Send + Sync>,
}

impl MockHandle {
    /// Wraps a mock object.
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        Self {
            object: Arc::new(object),
        }
    }

    /// Wraps an already-shared mock object.
    pub fn from_arc(object: Arc<dyn Any + Send + Sync>) -> Self {
        Self { object }
    }

    /// Borrows the underlying object as `T`, if that is what it is.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref()
    }

    /// Whether the underlying object is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.object.is::<T>()
    }

    /// Whether two handles point at the same underlying object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockHandle").finish_non_exhaustive()
    }
}

/// Builds a mock object on demand: lazy registrations and field-type
/// materialization.
pub type MockFactory = Arc<dyn Fn() -> MockHandle + Send + Sync>;

/// How long a registration lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MockScope {
    /// Discarded by `prepare_for_next_test`.
    Test,
    /// Survives across tests until the registry is cleared.
    Suite,
}

/// Where a registration's mock object comes from.
enum HandleSource {
    Ready(MockHandle),
    Lazy {
        factory: MockFactory,
        materialized: OnceLock<MockHandle>,
    },
}

/// One registered mock: identity, scope, the object (or the factory that
/// builds it), and the slot table gating its behaviors.
pub struct MockRegistration {
    mock_impl: MockImplId,
    instance: Option<InstanceId>,
    scope: MockScope,
    source: HandleSource,
    states: MockStateIndex,
}

impl MockRegistration {
    /// The implementation identity this registration answers for.
    pub fn mock_impl(&self) -> &MockImplId {
        &self.mock_impl
    }

    /// The instance this registration is scoped to, if any.
    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// The registration's lifetime class.
    pub fn scope(&self) -> MockScope {
        self.scope
    }

    /// The slot table gating this mock's behaviors.
    pub fn states(&self) -> &MockStateIndex {
        &self.states
    }

    /// The mock object, materializing it on first use for lazy
    /// registrations. At most one materialization happens even under
    /// concurrent resolution.
    pub fn handle(&self) -> MockHandle {
        match &self.source {
            HandleSource::Ready(handle) => handle.clone(),
            HandleSource::Lazy {
                factory,
                materialized,
            } => materialized.get_or_init(|| (factory)()).clone(),
        }
    }
}

impl fmt::Debug for MockRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRegistration")
            .field("mock_impl", &self.mock_impl)
            .field("instance", &self.instance)
            .field("scope", &self.scope)
            .field("slots", &self.states.len())
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct RegistrationKey {
    mock_impl: MockImplId,
    instance: Option<InstanceId>,
}

impl RegistrationKey {
    fn describe(&self) -> String {
        match self.instance {
            Some(instance) => format!("{}{}", self.mock_impl, instance),
            None => self.mock_impl.to_string(),
        }
    }
}

/// Maps mock identities to live mock state and dispatches call-site queries.
#[derive(Default)]
pub struct MockRegistry {
    mocks: RwLock<HashMap<RegistrationKey, Arc<MockRegistration>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A test thread panicking mid-replay must not wedge the registry for the
    // rest of the run, so lock poisoning is recovered, not propagated.
    fn mocks_read(&self) -> RwLockReadGuard<'_, HashMap<RegistrationKey, Arc<MockRegistration>>> {
        self.mocks.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mocks_write(&self) -> RwLockWriteGuard<'_, HashMap<RegistrationKey, Arc<MockRegistration>>> {
        self.mocks.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a mock with an already-built object.
    ///
    /// `instance` of `None` registers a type-scoped mock that services every
    /// instance of the mocked type (and all static call sites); `Some`
    /// shadows the type-scoped registration for that one instance.
    pub fn register(
        &self,
        mock_impl: MockImplId,
        instance: Option<InstanceId>,
        handle: MockHandle,
        policies: impl IntoIterator<Item = SlotPolicy>,
        scope: MockScope,
    ) -> Result<()> {
        self.insert(mock_impl, instance, HandleSource::Ready(handle), policies, scope)
    }

    /// Registers a mock whose object is built on first resolution.
    pub fn register_lazy(
        &self,
        mock_impl: MockImplId,
        instance: Option<InstanceId>,
        factory: MockFactory,
        policies: impl IntoIterator<Item = SlotPolicy>,
        scope: MockScope,
    ) -> Result<()> {
        self.insert(
            mock_impl,
            instance,
            HandleSource::Lazy {
                factory,
                materialized: OnceLock::new(),
            },
            policies,
            scope,
        )
    }

    fn insert(
        &self,
        mock_impl: MockImplId,
        instance: Option<InstanceId>,
        source: HandleSource,
        policies: impl IntoIterator<Item = SlotPolicy>,
        scope: MockScope,
    ) -> Result<()> {
        let key = RegistrationKey {
            mock_impl: mock_impl.clone(),
            instance,
        };
        let registration = Arc::new(MockRegistration {
            mock_impl,
            instance,
            scope,
            source,
            states: MockStateIndex::new(policies),
        });

        let mut mocks = self.mocks_write();
        if mocks.contains_key(&key) {
            return Err(HarnessError::DuplicateRegistration {
                key: key.describe(),
            });
        }
        debug!(
            mock = %key.describe(),
            scope = ?scope,
            slots = registration.states.len(),
            "registered mock"
        );
        mocks.insert(key, registration);
        Ok(())
    }

    /// Finds the registration servicing a call site: the exact
    /// (implementation, instance) registration first, then the type-scoped
    /// one as fallback.
    pub fn resolve(
        &self,
        mock_impl: &MockImplId,
        instance: Option<InstanceId>,
    ) -> Option<Arc<MockRegistration>> {
        let mocks = self.mocks_read();
        if instance.is_some() {
            let exact = RegistrationKey {
                mock_impl: mock_impl.clone(),
                instance,
            };
            if let Some(registration) = mocks.get(&exact) {
                return Some(Arc::clone(registration));
            }
        }
        let type_scoped = RegistrationKey {
            mock_impl: mock_impl.clone(),
            instance: None,
        };
        mocks.get(&type_scoped).map(Arc::clone)
    }

    /// The mock object that should service this call, or `None` when no mock
    /// is registered for the combination — the signal to fall through to the
    /// original behavior.
    pub fn get_mock(
        &self,
        mock_impl: &MockImplId,
        instance: Option<InstanceId>,
    ) -> Option<MockHandle> {
        self.resolve(mock_impl, instance)
            .map(|registration| registration.handle())
    }

    /// Decides whether one call gets intercepted.
    ///
    /// `false` when no mock is registered (fall through to the original
    /// code). `true` unconditionally for negative `slot_index` (a mock with
    /// no gated behaviors). Otherwise the verdict of the slot at
    /// `slot_index`, which counts the call when it accepts.
    ///
    /// # Panics
    ///
    /// Panics if a non-negative `slot_index` is beyond the registration's
    /// slot table; see [`MockStateIndex::verdict`].
    pub fn update_mock_state(
        &self,
        mock_impl: &MockImplId,
        instance: Option<InstanceId>,
        slot_index: i32,
    ) -> bool {
        let Some(registration) = self.resolve(mock_impl, instance) else {
            return false;
        };
        if slot_index < 0 {
            return true;
        }
        let verdict = registration.states.verdict(mock_impl, slot_index as usize);
        trace!(mock = %mock_impl, slot_index, verdict, "slot dispatch");
        verdict
    }

    /// Checks every key the rewriting engine will emit against the current
    /// registrations, so drift surfaces as a usage error at setup time
    /// instead of a panic mid-replay.
    ///
    /// Ungated keys only require the registration to exist; gated keys also
    /// require the slot index to be within the registered behavior table.
    pub fn validate_call_sites(&self, sites: &[CallSiteKey]) -> Result<()> {
        for site in sites {
            let Some(registration) = self.resolve(site.mock_impl(), site.instance()) else {
                return Err(HarnessError::UnknownCallSiteTarget {
                    mock_impl: site.mock_impl().name().to_string(),
                });
            };
            let slot_index = site.slot_index();
            if slot_index >= 0 && slot_index as usize >= registration.states.len() {
                return Err(HarnessError::SlotIndexOutOfRange {
                    mock_impl: site.mock_impl().name().to_string(),
                    slot_index,
                    slot_count: registration.states.len(),
                });
            }
        }
        Ok(())
    }

    /// Drops every test-scoped registration. Suite-scoped mocks survive.
    pub fn discard_test_scoped(&self) {
        let mut mocks = self.mocks_write();
        let before = mocks.len();
        mocks.retain(|_, registration| registration.scope == MockScope::Suite);
        let dropped = before - mocks.len();
        if dropped > 0 {
            debug!(dropped, "discarded test-scoped mock registrations");
        }
    }

    /// Drops every registration, suite-scoped included.
    pub fn clear(&self) {
        self.mocks_write().clear();
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.mocks_read().len()
    }

    /// Whether no mocks are registered.
    pub fn is_empty(&self) -> bool {
        self.mocks_read().is_empty()
    }

    /// All live registrations in a stable order, for diagnostics snapshots.
    pub fn registrations(&self) -> Vec<Arc<MockRegistration>> {
        let mut registrations: Vec<_> = self.mocks_read().values().map(Arc::clone).collect();
        registrations.sort_by(|a, b| {
            a.mock_impl
                .cmp(&b.mock_impl)
                .then_with(|| a.instance.cmp(&b.instance))
        });
        registrations
    }
}

impl fmt::Debug for MockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockRegistry")
            .field("registrations", &self.len())
            .finish()
    }
}
