//! Mock registration and dispatch sub-system.
//!
//! Sub-modules:
//! - [`slot`]          — Per-behavior state slots and interception policies.
//! - [`index`]         — Ordered slot tables, one per registration.
//! - [`mocks`]         — The registry proper: registration, resolution, dispatch.
//! - [`redefinitions`] — Field-type redefinition records for the running test.

pub mod index;
pub mod mocks;
pub mod redefinitions;
pub mod slot;

// Top-level re-exports.
pub use index::MockStateIndex;
pub use mocks::{MockFactory, MockHandle, MockRegistration, MockRegistry, MockScope};
pub use redefinitions::{FieldTypeRedefinitions, RedefinedType};
pub use slot::{MockStateSlot, SlotPolicy};
