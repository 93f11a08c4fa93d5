//! The coordinator façade and its no-mocking zones.
//!
//! Sub-modules:
//! - [`test_run`] — [`TestRunCoordinator`], the per-test-run composition root.
//! - [`zone`]     — Per-thread suppression of mock interception.

pub mod test_run;
pub mod zone;

// Top-level re-exports.
pub use test_run::{FixtureHandle, TestRunCoordinator};
pub use zone::{NoMockingZoneGuard, NoMockingZoneTracker};
