//! Ownership of the currently executing test's session.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::session::record_replay::RecordReplaySession;

/// Owns the live [`RecordReplaySession`] for the test presently executing.
///
/// At most one session exists at a time; it is created lazily on first need
/// and discarded wholesale by the coordinator's between-tests reset.
#[derive(Debug, Default)]
pub struct ExecutingTestContext {
    session: Mutex<Option<RecordReplaySession>>,
}

/// Exclusive borrowed access to the live session. Holding the guard blocks
/// other session access (not the dispatch hot path, which never takes this
/// lock), so keep it short-lived.
#[derive(Debug)]
pub struct SessionGuard<'a> {
    inner: MutexGuard<'a, Option<RecordReplaySession>>,
}

impl Deref for SessionGuard<'_> {
    type Target = RecordReplaySession;

    fn deref(&self) -> &RecordReplaySession {
        self.inner
            .as_ref()
            .expect("SessionGuard is only constructed over a live session")
    }
}

impl DerefMut for SessionGuard<'_> {
    fn deref_mut(&mut self) -> &mut RecordReplaySession {
        self.inner
            .as_mut()
            .expect("SessionGuard is only constructed over a live session")
    }
}

impl ExecutingTestContext {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking test thread must not wedge session access for the rest of
    // the run.
    fn lock(&self) -> MutexGuard<'_, Option<RecordReplaySession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The live session, if one exists. Never creates one.
    pub fn current(&self) -> Option<SessionGuard<'_>> {
        let inner = self.lock();
        if inner.is_some() {
            Some(SessionGuard { inner })
        } else {
            None
        }
    }

    /// The live session, creating a fresh recording-phase one if none exists
    /// yet. Idempotent within a test.
    pub fn get_or_create(&self, test_id: u64) -> SessionGuard<'_> {
        let mut inner = self.lock();
        if inner.is_none() {
            debug!(test_id, "creating record/replay session");
            *inner = Some(RecordReplaySession::new(test_id));
        }
        SessionGuard { inner }
    }

    /// Drops the session outright. This is the between-tests reset: nothing
    /// of the previous test's expectations or invocation log survives it.
    pub fn discard_session(&self) {
        if let Some(session) = self.lock().take() {
            if !session.is_finished() {
                warn!(
                    test_id = session.test_id(),
                    phase = %session.phase(),
                    "discarding a session that never finished execution"
                );
            }
        }
    }

    /// Terminates the live session in place (terminal phase, heavy state
    /// released). No-op when no session exists; idempotent.
    pub fn finish_execution(&self) {
        let mut inner = self.lock();
        if let Some(session) = inner.as_mut() {
            session.finish_execution();
        }
    }
}
