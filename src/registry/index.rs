//! Ordered slot tables, one per registered mock.

use crate::callsite::MockImplId;
use crate::registry::slot::{MockStateSlot, SlotPolicy};

/// The ordered collection of mock-state slots for one registration, indexed
/// by the behavior indexes the rewriter embeds at call sites.
///
/// The table's structure is frozen at registration time; only the slots'
/// internal counters mutate afterwards, so concurrent dispatch needs no lock
/// here.
#[derive(Debug)]
pub struct MockStateIndex {
    slots: Vec<MockStateSlot>,
}

impl MockStateIndex {
    pub(crate) fn new(policies: impl IntoIterator<Item = SlotPolicy>) -> Self {
        Self {
            slots: policies.into_iter().map(MockStateSlot::new).collect(),
        }
    }

    /// Dispatches one call to the slot at `slot_index` and returns its
    /// verdict.
    ///
    /// # Panics
    ///
    /// Panics if `slot_index` is beyond the table. An out-of-range index
    /// means the rewriting engine and this registration disagree about the
    /// mock's behavior table — guessing a verdict would mask the drift, so
    /// the harness aborts with the full context instead.
    pub fn verdict(&self, mock_impl: &MockImplId, slot_index: usize) -> bool {
        match self.slots.get(slot_index) {
            Some(slot) => slot.update(),
            None => panic!(
                "mock-state slot index {slot_index} is out of range for {mock_impl} \
                 ({count} slots registered); rewritten call sites and the mock \
                 registration are out of sync",
                count = self.slots.len(),
            ),
        }
    }

    /// Read access to one slot's bookkeeping, `None` when out of range.
    pub fn slot(&self, slot_index: usize) -> Option<&MockStateSlot> {
        self.slots.get(slot_index)
    }

    /// Iterates the slots in behavior order.
    pub fn iter(&self) -> impl Iterator<Item = &MockStateSlot> {
        self.slots.iter()
    }

    /// Number of gated behaviors in this registration.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the registration has no gated behaviors.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
