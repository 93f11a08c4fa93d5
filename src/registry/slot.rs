//! Per-behavior mock-state slots.
//!
//! A slot is the bookkeeping unit for one interceptable behavior of one mock
//! implementation: whether it is active, how it decides interception, and how
//! many calls it has matched. Slot state is the only thing that mutates on
//! the dispatch hot path, so all of it is atomic — verdicts from concurrent
//! threads never lose an update.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

/// Interception policy fixed per slot at mock-registration time.
///
/// The registry never interprets these; it dispatches to the slot and
/// returns the slot's verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SlotPolicy {
    /// Every call is intercepted.
    Always,
    /// Only the first call is intercepted; later calls pass through.
    FirstOnly,
    /// Calls are intercepted while the budget lasts, then pass through.
    Budget(u64),
}

/// Activation and invocation bookkeeping for one interceptable behavior.
#[derive(Debug)]
pub struct MockStateSlot {
    policy: SlotPolicy,
    active: AtomicBool,
    matched: AtomicU64,
}

impl MockStateSlot {
    pub(crate) fn new(policy: SlotPolicy) -> Self {
        Self {
            policy,
            active: AtomicBool::new(true),
            matched: AtomicU64::new(0),
        }
    }

    /// The policy this slot was registered with.
    pub fn policy(&self) -> SlotPolicy {
        self.policy
    }

    /// Whether the behavior currently applies at all.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Activates or deactivates the behavior. Deactivated slots refuse
    /// interception without touching their match count.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// How many calls this slot has accepted so far.
    pub fn matched_count(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    /// Applies the slot's policy to one incoming call and returns whether
    /// that call is intercepted. Accepted calls increment the match count;
    /// refused calls leave it untouched.
    ///
    /// Counters are independent bookkeeping with no ordering payload, so
    /// relaxed atomics suffice; the compare-exchange loops make `FirstOnly`
    /// and `Budget` exact under contention.
    pub fn update(&self) -> bool {
        if !self.active.load(Ordering::Relaxed) {
            return false;
        }

        match self.policy {
            SlotPolicy::Always => {
                self.matched.fetch_add(1, Ordering::Relaxed);
                true
            }
            SlotPolicy::FirstOnly => self
                .matched
                .compare_exchange(0, 1, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok(),
            SlotPolicy::Budget(limit) => self
                .matched
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |matched| {
                    if matched < limit {
                        Some(matched + 1)
                    } else {
                        None
                    }
                })
                .is_ok(),
        }
    }
}
