//! Scripted interception points.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use mockrun::{CallSiteKey, MockHandle, TestRunCoordinator};

/// What one rewritten call did.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// The call was intercepted and this mock serviced it.
    Intercepted(MockHandle),
    /// The call fell through to the original behavior.
    PassedThrough,
}

impl CallOutcome {
    pub fn is_intercepted(&self) -> bool {
        matches!(self, CallOutcome::Intercepted(_))
    }

    /// The servicing mock, when intercepted.
    pub fn mock(&self) -> Option<&MockHandle> {
        match self {
            CallOutcome::Intercepted(mock) => Some(mock),
            CallOutcome::PassedThrough => None,
        }
    }
}

/// One interception point, as the rewriting engine would emit it.
///
/// Embeds a [`CallSiteKey`] and, on every [`fire`](Self::fire), performs the
/// two-step dance real rewritten code performs: ask the coordinator whether
/// to intercept, then resolve the servicing mock. Counters record both
/// outcomes so tests can assert on interception behavior without inspecting
/// coordinator internals.
pub struct RewrittenCallSite {
    coordinator: Arc<TestRunCoordinator>,
    key: CallSiteKey,
    intercepted: AtomicU64,
    passed_through: AtomicU64,
}

impl RewrittenCallSite {
    pub fn new(coordinator: Arc<TestRunCoordinator>, key: CallSiteKey) -> Self {
        Self {
            coordinator,
            key,
            intercepted: AtomicU64::new(0),
            passed_through: AtomicU64::new(0),
        }
    }

    /// The key this site embeds.
    pub fn key(&self) -> &CallSiteKey {
        &self.key
    }

    /// Executes the call site once.
    pub fn fire(&self) -> CallOutcome {
        if self.coordinator.update_mock_state(&self.key) {
            if let Some(mock) = self
                .coordinator
                .get_mock(self.key.mock_impl(), self.key.instance())
            {
                self.intercepted.fetch_add(1, Ordering::Relaxed);
                return CallOutcome::Intercepted(mock);
            }
        }
        self.passed_through.fetch_add(1, Ordering::Relaxed);
        CallOutcome::PassedThrough
    }

    /// How many calls this site has had intercepted.
    pub fn intercepted(&self) -> u64 {
        self.intercepted.load(Ordering::Relaxed)
    }

    /// How many calls fell through to the original behavior.
    pub fn passed_through(&self) -> u64 {
        self.passed_through.load(Ordering::Relaxed)
    }
}
