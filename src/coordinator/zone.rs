//! No-mocking zones: per-thread suppression of mock interception.
//!
//! When the harness's own machinery runs — materializing a mock, logging,
//! building a diagnostics snapshot — any instrumented code it touches must
//! not be intercepted again, or the harness ends up mocking itself into
//! infinite recursion. A thread marks such regions by entering a zone; the
//! dispatch hot paths check [`is_inside`](NoMockingZoneTracker::is_inside)
//! and pass straight through while the mark is set. Zones are strictly
//! per-thread: other threads keep full interception.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, ThreadId};

/// Per-thread reentrancy guard for the harness's internals.
///
/// Each thread owns an explicit *signed net* counter, created on its first
/// `enter`/`exit` and keyed by thread identity: `enter` adds one, `exit`
/// subtracts one, and the thread is inside a zone exactly while the net is
/// greater than zero. The net is deliberately signed — an `exit` without a
/// matching `enter` drives it negative rather than clamping or panicking, a
/// later `enter` restores the balance, and `is_inside` stays false until the
/// net rises above zero. Unbalanced pairs are therefore visible in the
/// arithmetic instead of being silently absorbed.
///
/// This cannot fail: it is pure bookkeeping, reentrant by construction.
#[derive(Debug, Default)]
pub struct NoMockingZoneTracker {
    counters: RwLock<HashMap<ThreadId, Arc<AtomicI64>>>,
}

impl NoMockingZoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // Zone bookkeeping runs inside harness internals; a panicking test
    // thread must not poison it for every other thread.
    fn counters_read(&self) -> RwLockReadGuard<'_, HashMap<ThreadId, Arc<AtomicI64>>> {
        self.counters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn counters_write(&self) -> RwLockWriteGuard<'_, HashMap<ThreadId, Arc<AtomicI64>>> {
        self.counters.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_delta(&self, delta: i64) {
        let thread_id = thread::current().id();
        {
            let counters = self.counters_read();
            if let Some(counter) = counters.get(&thread_id) {
                counter.fetch_add(delta, Ordering::Relaxed);
                return;
            }
        }
        // First touch on this thread: create the counter explicitly.
        self.counters_write()
            .entry(thread_id)
            .or_insert_with(|| Arc::new(AtomicI64::new(0)))
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Marks the current thread as one level deeper inside a zone.
    pub fn enter(&self) {
        self.apply_delta(1);
    }

    /// Marks the current thread as leaving one zone level.
    pub fn exit(&self) {
        self.apply_delta(-1);
    }

    /// Enters a zone and returns a guard that exits it on drop, so harness
    /// internals stay balanced across early returns and panics.
    pub fn enter_scoped(&self) -> NoMockingZoneGuard<'_> {
        self.enter();
        NoMockingZoneGuard { tracker: self }
    }

    /// Whether the current thread is inside any zone (net > 0).
    pub fn is_inside(&self) -> bool {
        self.current_net() > 0
    }

    /// The current thread's signed net of enters minus exits since the last
    /// [`clear`](Self::clear); zero when the thread was never marked.
    pub fn current_net(&self) -> i64 {
        let thread_id = thread::current().id();
        self.counters_read()
            .get(&thread_id)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Resets the current thread's counter entirely. Used at thread-pool
    /// reuse boundaries so zone state never leaks into an unrelated task.
    pub fn clear(&self) {
        self.counters_write().remove(&thread::current().id());
    }

    /// How many threads currently sit inside a zone (diagnostics only).
    pub fn threads_inside(&self) -> usize {
        self.counters_read()
            .values()
            .filter(|counter| counter.load(Ordering::Relaxed) > 0)
            .count()
    }
}

/// RAII handle for one zone level on the constructing thread.
#[derive(Debug)]
pub struct NoMockingZoneGuard<'a> {
    tracker: &'a NoMockingZoneTracker,
}

impl Drop for NoMockingZoneGuard<'_> {
    fn drop(&mut self) {
        self.tracker.exit();
    }
}
