//! Per-test-run state coordination for a mock-enabled test harness.
//!
//! A rewriting engine (external to this crate) injects calls into code under
//! test; this crate is what those calls land on. One explicitly constructed
//! [`TestRunCoordinator`] scopes everything mutable to "the currently running
//! test": which mocks are registered and for which instances, what
//! record/replay phase the test is in, which field types were redefined as
//! mockable, and which threads are inside a no-mocking zone where
//! interception must stay off.
//!
//! Sub-systems:
//! - [`coordinator`] — The façade, test lifecycle, no-mocking zones.
//! - [`registry`]    — Mock registration, resolution, slot dispatch.
//! - [`session`]     — The record/replay/verify phase machine.
//! - [`callsite`]    — The structured contract rewritten call sites embed.
//! - [`diagnostics`] — Serializable state snapshots for failure reports.
//! - [`error`]       — Usage-error taxonomy.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mockrun::{
//!     CallSiteKey, MockHandle, MockImplId, MockScope, SlotPolicy, TestRunCoordinator,
//! };
//!
//! struct FrozenClock;
//!
//! # fn main() -> mockrun::Result<()> {
//! let coordinator = Arc::new(TestRunCoordinator::new());
//! coordinator.prepare_for_next_test();
//!
//! let clock = MockImplId::new("FrozenClock");
//! coordinator.registry().register(
//!     clock.clone(),
//!     None,
//!     MockHandle::new(FrozenClock),
//!     [SlotPolicy::Always],
//!     MockScope::Test,
//! )?;
//!
//! // What a rewritten call site does before dispatching to a mock:
//! let site = CallSiteKey::gated(clock.clone(), None, 0);
//! if coordinator.update_mock_state(&site) {
//!     let mock = coordinator.get_mock(&clock, None).unwrap();
//!     assert!(mock.is::<FrozenClock>());
//! }
//!
//! // The authoritative reset between tests.
//! coordinator.prepare_for_next_test();
//! assert!(coordinator.get_mock(&clock, None).is_none());
//! # Ok(())
//! # }
//! ```

pub mod callsite;
pub mod coordinator;
pub mod diagnostics;
pub mod error;
pub mod registry;
pub mod session;

// Top-level re-exports — the surface embedders program against.
pub use callsite::{CallSiteKey, InstanceId, MockImplId, TypeName, UNGATED_SLOT};
pub use coordinator::{FixtureHandle, NoMockingZoneGuard, NoMockingZoneTracker, TestRunCoordinator};
pub use diagnostics::CoordinatorSnapshot;
pub use error::{HarnessError, Result};
pub use registry::{
    FieldTypeRedefinitions, MockFactory, MockHandle, MockRegistry, MockScope, RedefinedType,
    SlotPolicy,
};
pub use session::{SessionGuard, SessionPhase};
