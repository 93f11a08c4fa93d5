//! Test helpers for the `mockrun` coordinator.
//!
//! The coordinator's two external collaborators — the rewriting engine that
//! injects interception calls and the test-framework adapter that brackets
//! each test — live outside the core crate. This crate provides scripted
//! stand-ins for both, so integration tests can drive the coordinator the
//! way real embedders do:
//!
//! - [`TestScope`] — RAII test-lifecycle bracketing (the adapter's job).
//! - [`RewrittenCallSite`] — a scripted interception point (the rewriter's
//!   job), with pass-through/interception counters.
//! - [`logging`] — once-only `tracing` subscriber setup for test output.

pub mod callsites;
pub mod logging;
pub mod scenario;

pub use callsites::{CallOutcome, RewrittenCallSite};
pub use logging::init_test_logging;
pub use scenario::TestScope;
