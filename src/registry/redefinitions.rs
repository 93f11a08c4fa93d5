//! Field-type redefinition records for the currently running test.
//!
//! When a test fixture declares fields whose types get turned into mockable
//! types, the harness records here *which* declared types were redefined and
//! *how* to build a mock instance for each. The record is owned by the
//! coordinator for exactly one test: set at setup, cleared at teardown, and
//! its presence is what makes verification a legal operation.

use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::callsite::{MockImplId, TypeName};
use crate::registry::mocks::{MockFactory, MockHandle};

/// How one declared field type was redefined as mockable.
pub struct RedefinedType {
    mock_impl: MockImplId,
    factory: MockFactory,
}

impl RedefinedType {
    /// Records a redefinition serviced by `mock_impl`, with `factory`
    /// building the mock instance injected into the fixture field.
    pub fn new(mock_impl: MockImplId, factory: MockFactory) -> Self {
        Self { mock_impl, factory }
    }

    /// The mock implementation servicing the redefined type.
    pub fn mock_impl(&self) -> &MockImplId {
        &self.mock_impl
    }

    /// Builds a mock instance for the redefined type.
    pub fn materialize(&self) -> MockHandle {
        (self.factory)()
    }
}

impl fmt::Debug for RedefinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedefinedType")
            .field("mock_impl", &self.mock_impl)
            .finish_non_exhaustive()
    }
}

/// Which declared types were redefined as mockable for the current test.
///
/// Built during fixture setup by the (external) injection layer, handed to
/// the coordinator with `set_field_type_redefinitions`, and dropped at
/// teardown. Absence means "no field-level mocking active".
#[derive(Debug, Default)]
pub struct FieldTypeRedefinitions {
    by_type: HashMap<TypeName, RedefinedType>,
}

impl FieldTypeRedefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a redefinition for `target`, returning the previous record if
    /// the type was already redefined.
    pub fn add(&mut self, target: TypeName, redefinition: RedefinedType) -> Option<RedefinedType> {
        self.by_type.insert(target, redefinition)
    }

    /// Whether `target` was redefined for the current test.
    pub fn contains(&self, target: &TypeName) -> bool {
        self.by_type.contains_key(target)
    }

    /// Builds a mock instance for a redefined type, `None` when the type was
    /// not redefined.
    pub fn materialize(&self, target: &TypeName) -> Option<MockHandle> {
        let redefinition = self.by_type.get(target)?;
        trace!(target = %target, mock_impl = %redefinition.mock_impl(), "materializing redefined type");
        Some(redefinition.materialize())
    }

    /// The redefined types, in no particular order.
    pub fn targets(&self) -> impl Iterator<Item = &TypeName> {
        self.by_type.keys()
    }

    /// Number of redefined types.
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Whether no types were redefined.
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}
