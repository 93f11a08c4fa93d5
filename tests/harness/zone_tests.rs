//! No-mocking zones: suppression, reentrancy, thread isolation.

use std::sync::Arc;
use std::thread;

use mockrun::{CallSiteKey, MockScope, NoMockingZoneTracker, SlotPolicy};
use mockrun_testkit::RewrittenCallSite;
use proptest::prelude::*;

use crate::common::{coordinator, register};

#[test]
fn hot_paths_pass_through_while_inside_a_zone() {
    let coordinator = coordinator();
    let mock_impl = register(&coordinator, "LedgerMock", None, [SlotPolicy::Always], MockScope::Test);
    let site = RewrittenCallSite::new(
        Arc::clone(&coordinator),
        CallSiteKey::gated(mock_impl, None, 0),
    );

    assert!(site.fire().is_intercepted());
    {
        let _zone = coordinator.no_mocking_zone();
        assert!(!site.fire().is_intercepted());
    }
    assert!(site.fire().is_intercepted());

    // Suppressed calls never touch slot bookkeeping.
    assert_eq!(coordinator.snapshot().mocks[0].slots[0].matched, 2);
}

// Outer enter, nested harness code enters/exits twice, outer exit: inside
// until the outer exit, and the net matches the arithmetic sum throughout.
#[test]
fn nested_zone_levels_unwind_to_the_outer_exit() {
    let tracker = NoMockingZoneTracker::new();

    tracker.enter();
    for _ in 0..2 {
        tracker.enter();
        assert!(tracker.is_inside());
        tracker.exit();
    }
    assert!(tracker.is_inside());
    tracker.exit();
    assert!(!tracker.is_inside());
    assert_eq!(tracker.current_net(), 0);
}

#[test]
fn other_threads_stay_intercepted_while_one_is_inside() {
    let coordinator = coordinator();
    let mock_impl = register(&coordinator, "LedgerMock", None, [SlotPolicy::Always], MockScope::Test);
    let site = Arc::new(RewrittenCallSite::new(
        Arc::clone(&coordinator),
        CallSiteKey::gated(mock_impl, None, 0),
    ));

    let _zone = coordinator.no_mocking_zone();
    assert!(!site.fire().is_intercepted());

    let intercepted_elsewhere = {
        let site = Arc::clone(&site);
        thread::spawn(move || site.fire().is_intercepted())
            .join()
            .expect("probe thread panicked")
    };
    assert!(intercepted_elsewhere);
}

#[test]
fn clear_resets_only_the_calling_thread() {
    let coordinator = coordinator();
    coordinator.zone_tracker().enter();

    let handle = {
        let coordinator = Arc::clone(&coordinator);
        thread::spawn(move || {
            coordinator.zone_tracker().enter();
            // Thread-pool reuse boundary: the worker scrubs its own state.
            coordinator.zone_tracker().clear();
            coordinator.zone_tracker().is_inside()
        })
    };
    assert!(!handle.join().expect("worker thread panicked"));
    assert!(coordinator.zone_tracker().is_inside());

    coordinator.zone_tracker().clear();
    assert!(!coordinator.zone_tracker().is_inside());
}

#[test]
fn materialization_runs_suppressed_but_leaves_the_thread_clean() {
    use mockrun::{FieldTypeRedefinitions, MockHandle, MockImplId, RedefinedType, TypeName};

    let coordinator = coordinator();
    let target = TypeName::new("payments::Ledger");
    let mut redefinitions = FieldTypeRedefinitions::new();
    {
        let coordinator = Arc::clone(&coordinator);
        redefinitions.add(
            target.clone(),
            RedefinedType::new(
                MockImplId::new("LedgerMock"),
                Arc::new(move || {
                    // The factory itself is harness machinery.
                    assert!(coordinator.zone_tracker().is_inside());
                    MockHandle::new(())
                }),
            ),
        );
    }
    coordinator.set_field_type_redefinitions(Some(redefinitions));

    assert!(coordinator.materialize_redefined(&target).is_some());
    assert!(!coordinator.zone_tracker().is_inside());
}

proptest! {
    // For any enter/exit sequence on one thread, is_inside is exactly
    // "net of enters minus exits > 0" — unbalanced exits included.
    #[test]
    fn net_arithmetic_decides_inside(ops in prop::collection::vec(any::<bool>(), 0..64)) {
        let tracker = NoMockingZoneTracker::new();
        let mut net: i64 = 0;
        for &enter in &ops {
            if enter {
                tracker.enter();
                net += 1;
            } else {
                tracker.exit();
                net -= 1;
            }
            prop_assert_eq!(tracker.current_net(), net);
            prop_assert_eq!(tracker.is_inside(), net > 0);
        }
        tracker.clear();
        prop_assert_eq!(tracker.current_net(), 0);
        prop_assert!(!tracker.is_inside());
    }
}
