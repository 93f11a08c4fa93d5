//! Record/replay/verify lifecycle through the coordinator's surface.

use std::sync::Arc;

use mockrun::{
    CallSiteKey, FieldTypeRedefinitions, HarnessError, MockImplId, SessionPhase,
};
use mockrun_testkit::TestScope;

use crate::common::coordinator;

fn ledger_site(slot: u32) -> CallSiteKey {
    CallSiteKey::gated(MockImplId::new("LedgerMock"), None, slot)
}

#[test]
fn verifying_without_mocking_context_fails_and_mutates_nothing() {
    let coordinator = coordinator();
    let _scope = TestScope::begin(Arc::clone(&coordinator), "payments::LedgerTest");
    coordinator.get_or_create_record_replay();

    let err = coordinator.record_replay_for_verifications().unwrap_err();
    assert_eq!(err, HarnessError::VerifyWithoutMockingContext);
    assert!(err.to_string().contains("invalid place to verify"));

    let session = coordinator.record_replay_for_running_test().unwrap();
    assert_eq!(session.phase(), SessionPhase::Recording);
}

#[test]
fn verifying_before_anything_executed_fails() {
    let coordinator = coordinator();
    let _scope = TestScope::begin(Arc::clone(&coordinator), "payments::LedgerTest")
        .with_redefinitions(FieldTypeRedefinitions::new());

    let err = coordinator.record_replay_for_verifications().unwrap_err();
    assert_eq!(err, HarnessError::NoSessionToVerify);
}

#[test]
fn record_replay_verify_round_trip() {
    let coordinator = coordinator();
    let _scope = TestScope::begin(Arc::clone(&coordinator), "payments::LedgerTest")
        .with_redefinitions(FieldTypeRedefinitions::new());

    {
        let mut session = coordinator.get_or_create_record_replay();
        session.record_expectation(ledger_site(0)).unwrap();
        session.record_expectation(ledger_site(1)).unwrap();
        session.begin_replay().unwrap();
        session.note_invocation(ledger_site(0)).unwrap();
        session.note_invocation(ledger_site(0)).unwrap();
        session.note_invocation(ledger_site(1)).unwrap();
    }

    let session = coordinator.record_replay_for_verifications().unwrap();
    assert_eq!(session.phase(), SessionPhase::Verifying);
    assert_eq!(session.declared().len(), 2);
    assert_eq!(session.observed_count(&ledger_site(0)), 2);
    assert_eq!(session.observed_count(&ledger_site(1)), 1);
}

#[test]
fn verification_is_idempotent_within_its_phase() {
    let coordinator = coordinator();
    let _scope = TestScope::begin(Arc::clone(&coordinator), "payments::LedgerTest")
        .with_redefinitions(FieldTypeRedefinitions::new());
    coordinator.get_or_create_record_replay();

    drop(coordinator.record_replay_for_verifications().unwrap());
    let again = coordinator.record_replay_for_verifications().unwrap();
    assert_eq!(again.phase(), SessionPhase::Verifying);
}

#[test]
fn finished_session_rejects_further_verification() {
    let coordinator = coordinator();
    let _scope = TestScope::begin(Arc::clone(&coordinator), "payments::LedgerTest")
        .with_redefinitions(FieldTypeRedefinitions::new());
    coordinator.get_or_create_record_replay();
    coordinator.finish_current_test_execution();

    let err = coordinator.record_replay_for_verifications().unwrap_err();
    assert_eq!(
        err,
        HarnessError::SessionFinished {
            operation: "begin_verification",
        }
    );
}

#[test]
fn phase_gated_bookkeeping_surfaces_fixture_ordering_bugs() {
    let coordinator = coordinator();
    let _scope = TestScope::begin(Arc::clone(&coordinator), "payments::LedgerTest");

    let mut session = coordinator.get_or_create_record_replay();
    session.begin_replay().unwrap();

    // Declaring an expectation after replay started is a fixture bug.
    let err = session.record_expectation(ledger_site(0)).unwrap_err();
    assert_eq!(
        err,
        HarnessError::WrongPhase {
            operation: "record_expectation",
            required: SessionPhase::Recording,
            actual: SessionPhase::Replaying,
        }
    );
}
