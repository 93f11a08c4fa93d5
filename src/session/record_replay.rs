//! The record → replay → verify state machine for one test execution.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::callsite::CallSiteKey;
use crate::error::{HarnessError, Result};

/// Phase of one test's expectation lifecycle.
///
/// Declaration order is lifecycle order: comparisons encode "earlier than",
/// which is what makes backward transitions detectable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SessionPhase {
    /// Expectations are being declared; bookkeeping only.
    Recording,
    /// The code under test is executing; call sites are consulted per call.
    Replaying,
    /// Assertions against recorded interactions are being evaluated.
    Verifying,
    /// Terminal. Further use of the session is a usage error.
    Done,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Recording => "recording",
            SessionPhase::Replaying => "replaying",
            SessionPhase::Verifying => "verifying",
            SessionPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// One test's expectation lifecycle: declared expectations, the invocation
/// log, and the phase gate that keeps fixture ordering honest.
///
/// Phases only move forward. Asking for the phase the session is already in
/// is a no-op; asking for an earlier phase, or anything after
/// [`finish_execution`](Self::finish_execution), is a usage error.
#[derive(Debug)]
pub struct RecordReplaySession {
    test_id: u64,
    phase: SessionPhase,
    declared: Vec<CallSiteKey>,
    observed: Vec<CallSiteKey>,
}

impl RecordReplaySession {
    pub(crate) fn new(test_id: u64) -> Self {
        Self {
            test_id,
            phase: SessionPhase::Recording,
            declared: Vec::new(),
            observed: Vec::new(),
        }
    }

    /// The test execution this session belongs to (diagnostics only).
    pub fn test_id(&self) -> u64 {
        self.test_id
    }

    /// The phase the session is currently in.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the session has reached its terminal phase.
    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Done
    }

    fn advance(&mut self, to: SessionPhase, operation: &'static str) -> Result<()> {
        if self.phase == SessionPhase::Done {
            return Err(HarnessError::SessionFinished { operation });
        }
        if to == self.phase {
            return Ok(());
        }
        if to < self.phase {
            return Err(HarnessError::BackwardPhaseTransition {
                from: self.phase,
                to,
            });
        }
        trace!(test_id = self.test_id, from = %self.phase, to = %to, "session phase transition");
        self.phase = to;
        Ok(())
    }

    fn require_phase(&self, required: SessionPhase, operation: &'static str) -> Result<()> {
        if self.phase == required {
            Ok(())
        } else {
            Err(HarnessError::WrongPhase {
                operation,
                required,
                actual: self.phase,
            })
        }
    }

    /// Moves from recording to replaying. Idempotent while replaying.
    pub fn begin_replay(&mut self) -> Result<()> {
        self.advance(SessionPhase::Replaying, "begin_replay")
    }

    /// Moves forward to verifying. Idempotent while verifying; legal from
    /// recording (a test may verify without an explicit replay marker).
    pub fn begin_verification(&mut self) -> Result<()> {
        self.advance(SessionPhase::Verifying, "begin_verification")
    }

    /// Declares one expected interaction. Recording phase only.
    pub fn record_expectation(&mut self, site: CallSiteKey) -> Result<()> {
        self.require_phase(SessionPhase::Recording, "record_expectation")?;
        self.declared.push(site);
        Ok(())
    }

    /// Logs one interaction observed while the code under test ran.
    /// Replaying phase only.
    pub fn note_invocation(&mut self, site: CallSiteKey) -> Result<()> {
        self.require_phase(SessionPhase::Replaying, "note_invocation")?;
        self.observed.push(site);
        Ok(())
    }

    /// The expectations declared during recording, in declaration order.
    pub fn declared(&self) -> &[CallSiteKey] {
        &self.declared
    }

    /// The invocation log from replay, in observation order.
    pub fn observed(&self) -> &[CallSiteKey] {
        &self.observed
    }

    /// How many times `site` appears in the invocation log.
    pub fn observed_count(&self, site: &CallSiteKey) -> usize {
        self.observed.iter().filter(|seen| *seen == site).count()
    }

    /// Terminates the session from whatever phase it is in and releases the
    /// heavy state (declared expectations, invocation log). Idempotent.
    pub fn finish_execution(&mut self) {
        if self.phase != SessionPhase::Done {
            debug!(test_id = self.test_id, from = %self.phase, "finishing record/replay session");
        }
        self.phase = SessionPhase::Done;
        self.declared = Vec::new();
        self.observed = Vec::new();
    }
}
