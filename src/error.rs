//! Error types surfaced by the coordinator.
//!
//! Everything in [`HarnessError`] is a *usage* error: a fixture-authoring
//! mistake the test author must see (verifying in the wrong place, driving a
//! session backward, registering the same mock twice). Expected misses — no
//! mock registered for a call, a slot refusing interception — are plain
//! `false`/`None` values, never errors. Invariant breaks between the
//! rewriting engine and the registry (an out-of-range slot index at dispatch
//! time) are not represented here either: they panic, because guessing would
//! hide real drift.

use thiserror::Error;

use crate::session::SessionPhase;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// A fixture-authoring mistake, reported with enough context to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// Verification was requested for a test that never set up any mocked
    /// fields or types.
    #[error("invalid place to verify expectations: no field-type redefinitions are set for the current test")]
    VerifyWithoutMockingContext,

    /// Verification was requested before anything executed in the current
    /// test, so there is no session to verify against.
    #[error("no record/replay session exists for the current test; nothing has executed yet")]
    NoSessionToVerify,

    /// An operation was attempted on a session that already finished.
    #[error("record/replay session is already finished; `{operation}` is not allowed")]
    SessionFinished {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// A session was asked to move backward through its lifecycle.
    #[error("record/replay session cannot move backward from {from} to {to}")]
    BackwardPhaseTransition {
        /// The phase the session is currently in.
        from: SessionPhase,
        /// The earlier phase that was requested.
        to: SessionPhase,
    },

    /// A phase-restricted operation was called in the wrong phase.
    #[error("`{operation}` requires the {required} phase, but the session is {actual}")]
    WrongPhase {
        /// The operation that was attempted.
        operation: &'static str,
        /// The phase the operation requires.
        required: SessionPhase,
        /// The phase the session is actually in.
        actual: SessionPhase,
    },

    /// A mock was registered twice for the same implementation/instance key
    /// without an intervening reset.
    #[error("mock registration for {key} already exists in the current scope")]
    DuplicateRegistration {
        /// Human-readable registration key ("Impl" or "Impl#instance").
        key: String,
    },

    /// Call-site validation found a key naming an implementation with no
    /// registration behind it.
    #[error("call site targets mock implementation {mock_impl}, which has no registration")]
    UnknownCallSiteTarget {
        /// The implementation the call site names.
        mock_impl: String,
    },

    /// Call-site validation found a gated slot index beyond the registered
    /// behavior table.
    #[error(
        "call site slot index {slot_index} is out of range for {mock_impl} \
         ({slot_count} slots registered)"
    )]
    SlotIndexOutOfRange {
        /// The implementation the call site names.
        mock_impl: String,
        /// The slot index the call site carries.
        slot_index: i32,
        /// How many slots the registration actually has.
        slot_count: usize,
    },
}
