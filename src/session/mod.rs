//! Record/replay session lifecycle for the running test.
//!
//! Sub-modules:
//! - [`record_replay`] — The forward-only phase machine and its bookkeeping.
//! - [`executing`]     — Ownership of the single live session.

pub mod executing;
pub mod record_replay;

// Top-level re-exports.
pub use executing::{ExecutingTestContext, SessionGuard};
pub use record_replay::{RecordReplaySession, SessionPhase};
