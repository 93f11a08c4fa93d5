//! The structured contract between rewritten call sites and the coordinator.
//!
//! The rewriting engine embeds, at every interception point, exactly three
//! pieces of information: which mock implementation the site targets, which
//! mocked instance it applies to (absent for static or type-scoped calls),
//! and the index of the behavior slot that gates it (negative when the mock
//! has no gated behaviors). This module defines those three as real types
//! instead of an encoded descriptor string, so registrations can be checked
//! against what the rewriter will emit (see
//! [`MockRegistry::validate_call_sites`](crate::registry::MockRegistry::validate_call_sites)).

use std::fmt;
use std::sync::Arc;

/// Slot index carried by call sites whose mock has no gated behaviors.
pub const UNGATED_SLOT: i32 = -1;

/// Identity of a mock-implementation type, as embedded at rewritten call
/// sites and used as the registry key.
///
/// Interned: clones are reference-count bumps, suitable for the hot path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockImplId(Arc<str>);

impl MockImplId {
    /// Builds an identity from an implementation name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Builds an identity from a Rust type, for harnesses whose mock
    /// implementations are themselves Rust types.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// The implementation name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MockImplId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one mocked instance, assigned by the rewriter's object table.
///
/// Opaque to the coordinator; equality is the only operation that matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Wraps a raw object-table id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw object-table id.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interned identity of a production or fixture type: redefinition targets,
/// the class under test.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    /// Builds an identity from a type name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Builds an identity from a Rust type.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one rewritten call site embeds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallSiteKey {
    mock_impl: MockImplId,
    instance: Option<InstanceId>,
    slot_index: i32,
}

impl CallSiteKey {
    /// A call site gated by the behavior slot at `slot_index`.
    ///
    /// # Panics
    ///
    /// Panics if `slot_index` exceeds `i32::MAX`. Wrapping would flip the
    /// site to ungated and mask rewriter drift instead of failing loudly.
    pub fn gated(mock_impl: MockImplId, instance: Option<InstanceId>, slot_index: u32) -> Self {
        let slot_index = i32::try_from(slot_index).unwrap_or_else(|_| {
            panic!("gated slot index {slot_index} for {mock_impl} exceeds the call-site range")
        });
        Self {
            mock_impl,
            instance,
            slot_index,
        }
    }

    /// A call site for a mock with no gated behaviors; interception is
    /// unconditional once the mock is registered.
    pub fn ungated(mock_impl: MockImplId, instance: Option<InstanceId>) -> Self {
        Self {
            mock_impl,
            instance,
            slot_index: UNGATED_SLOT,
        }
    }

    /// The mock implementation the site targets.
    pub fn mock_impl(&self) -> &MockImplId {
        &self.mock_impl
    }

    /// The mocked instance, absent for static or type-scoped sites.
    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// The raw slot index; negative means ungated.
    pub fn slot_index(&self) -> i32 {
        self.slot_index
    }

    /// Whether this site bypasses slot gating.
    pub fn is_ungated(&self) -> bool {
        self.slot_index < 0
    }
}

impl fmt::Display for CallSiteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mock_impl)?;
        if let Some(instance) = self.instance {
            write!(f, "{instance}")?;
        }
        if self.is_ungated() {
            write!(f, "[*]")
        } else {
            write!(f, "[{}]", self.slot_index)
        }
    }
}
