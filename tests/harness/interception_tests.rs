//! Call-site dispatch: resolution, slot policies, validation.

use std::sync::Arc;

use mockrun::{
    CallSiteKey, HarnessError, InstanceId, MockHandle, MockImplId, MockScope, SlotPolicy,
};
use mockrun_testkit::RewrittenCallSite;

use crate::common::{coordinator, register, AuditLogMock, FrozenClock};

#[test]
fn unregistered_implementation_passes_through_without_error() {
    let coordinator = coordinator();
    let site = RewrittenCallSite::new(
        Arc::clone(&coordinator),
        CallSiteKey::gated(MockImplId::new("GhostMock"), None, 7),
    );
    assert!(!site.fire().is_intercepted());
    assert_eq!(site.passed_through(), 1);
    assert!(coordinator.get_mock(&MockImplId::new("GhostMock"), None).is_none());
}

#[test]
fn ungated_site_intercepts_unconditionally_once_registered() {
    let coordinator = coordinator();
    let mock_impl = register(&coordinator, "ClockMock", None, [], MockScope::Test);
    let site = RewrittenCallSite::new(
        Arc::clone(&coordinator),
        CallSiteKey::ungated(mock_impl, None),
    );
    for _ in 0..4 {
        assert!(site.fire().is_intercepted());
    }
    assert_eq!(site.intercepted(), 4);
}

#[test]
fn first_only_slot_intercepts_exactly_one_call() {
    let coordinator = coordinator();
    let mock_impl = register(&coordinator, "LedgerMock", None, [SlotPolicy::FirstOnly], MockScope::Test);
    let site = RewrittenCallSite::new(
        Arc::clone(&coordinator),
        CallSiteKey::gated(mock_impl, None, 0),
    );

    assert!(site.fire().is_intercepted());
    assert!(!site.fire().is_intercepted());
    assert!(!site.fire().is_intercepted());
    assert_eq!(site.intercepted(), 1);
    assert_eq!(site.passed_through(), 2);
}

#[test]
fn budget_slot_passes_through_once_spent() {
    let coordinator = coordinator();
    let mock_impl = register(&coordinator, "LedgerMock", None, [SlotPolicy::Budget(2)], MockScope::Test);
    let site = RewrittenCallSite::new(
        Arc::clone(&coordinator),
        CallSiteKey::gated(mock_impl, None, 0),
    );

    let intercepted = (0..5).filter(|_| site.fire().is_intercepted()).count();
    assert_eq!(intercepted, 2);
}

#[test]
fn slots_are_independent_within_one_registration() {
    let coordinator = coordinator();
    let mock_impl = register(
        &coordinator,
        "LedgerMock",
        None,
        [SlotPolicy::FirstOnly, SlotPolicy::Always],
        MockScope::Test,
    );

    let first = CallSiteKey::gated(mock_impl.clone(), None, 0);
    let second = CallSiteKey::gated(mock_impl, None, 1);
    assert!(coordinator.update_mock_state(&first));
    assert!(!coordinator.update_mock_state(&first));
    // Exhausting slot 0 leaves slot 1 untouched.
    assert!(coordinator.update_mock_state(&second));
    assert!(coordinator.update_mock_state(&second));
}

#[test]
fn instance_scoped_registration_shadows_the_type_scoped_one() {
    let coordinator = coordinator();
    let mock_impl = MockImplId::new("ClockMock");

    coordinator
        .registry()
        .register(
            mock_impl.clone(),
            None,
            MockHandle::new(AuditLogMock),
            [SlotPolicy::Always],
            MockScope::Test,
        )
        .unwrap();
    coordinator
        .registry()
        .register(
            mock_impl.clone(),
            Some(InstanceId::new(7)),
            MockHandle::new(FrozenClock { now: 42 }),
            [SlotPolicy::Always],
            MockScope::Test,
        )
        .unwrap();

    let for_instance = coordinator
        .get_mock(&mock_impl, Some(InstanceId::new(7)))
        .expect("instance-scoped registration");
    assert!(for_instance.is::<FrozenClock>());

    // Any other instance falls back to the type-scoped mock.
    let for_other = coordinator
        .get_mock(&mock_impl, Some(InstanceId::new(8)))
        .expect("type-scoped fallback");
    assert!(for_other.is::<AuditLogMock>());

    let for_static = coordinator
        .get_mock(&mock_impl, None)
        .expect("static sites use the type-scoped mock");
    assert!(for_static.is::<AuditLogMock>());
}

#[test]
fn duplicate_registration_is_a_usage_error() {
    let coordinator = coordinator();
    register(&coordinator, "LedgerMock", None, [SlotPolicy::Always], MockScope::Test);

    let err = coordinator
        .registry()
        .register(
            MockImplId::new("LedgerMock"),
            None,
            MockHandle::new(AuditLogMock),
            [SlotPolicy::Always],
            MockScope::Test,
        )
        .unwrap_err();
    assert!(matches!(err, HarnessError::DuplicateRegistration { .. }));
}

#[test]
fn lazy_registration_materializes_on_first_resolution() {
    let coordinator = coordinator();
    let mock_impl = MockImplId::new("ClockMock");
    coordinator
        .registry()
        .register_lazy(
            mock_impl.clone(),
            None,
            Arc::new(|| MockHandle::new(FrozenClock { now: 42 })),
            [SlotPolicy::Always],
            MockScope::Test,
        )
        .unwrap();

    let first = coordinator.get_mock(&mock_impl, None).unwrap();
    let second = coordinator.get_mock(&mock_impl, None).unwrap();
    assert!(first.is::<FrozenClock>());
    // One materialization, shared thereafter.
    assert!(first.ptr_eq(&second));
}

#[test]
fn call_site_validation_catches_drift_at_setup_time() {
    let coordinator = coordinator();
    let mock_impl = register(
        &coordinator,
        "LedgerMock",
        None,
        [SlotPolicy::Always, SlotPolicy::Always],
        MockScope::Test,
    );

    let in_range = [
        CallSiteKey::gated(mock_impl.clone(), None, 0),
        CallSiteKey::gated(mock_impl.clone(), None, 1),
        CallSiteKey::ungated(mock_impl.clone(), None),
    ];
    coordinator.registry().validate_call_sites(&in_range).unwrap();

    let out_of_range = [CallSiteKey::gated(mock_impl, None, 2)];
    let err = coordinator
        .registry()
        .validate_call_sites(&out_of_range)
        .unwrap_err();
    assert_eq!(
        err,
        HarnessError::SlotIndexOutOfRange {
            mock_impl: "LedgerMock".to_string(),
            slot_index: 2,
            slot_count: 2,
        }
    );

    let unknown = [CallSiteKey::ungated(MockImplId::new("GhostMock"), None)];
    let err = coordinator.registry().validate_call_sites(&unknown).unwrap_err();
    assert!(matches!(err, HarnessError::UnknownCallSiteTarget { .. }));
}

#[test]
#[should_panic(expected = "out of sync")]
fn out_of_range_slot_at_dispatch_time_panics() {
    let coordinator = coordinator();
    let mock_impl = register(&coordinator, "LedgerMock", None, [SlotPolicy::Always], MockScope::Test);
    coordinator.update_mock_state(&CallSiteKey::gated(mock_impl, None, 5));
}
