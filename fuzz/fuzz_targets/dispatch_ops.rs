#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mockrun::{
    CallSiteKey, InstanceId, MockHandle, MockImplId, MockScope, SlotPolicy, TestRunCoordinator,
};

#[derive(Arbitrary, Debug)]
enum HarnessOp {
    Register {
        mock: u8,
        instance: Option<u8>,
        slots: Vec<FuzzPolicy>,
        suite_scoped: bool,
    },
    GetMock {
        mock: u8,
        instance: Option<u8>,
    },
    UpdateMockState {
        mock: u8,
        instance: Option<u8>,
        // Kept in range; out-of-range dispatch is a deliberate panic.
        slot: Option<u8>,
    },
    EnterZone,
    ExitZone,
    PrepareForNextTest,
    FinishExecution,
    Snapshot,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzPolicy {
    Always,
    FirstOnly,
    Budget(u8),
}

impl From<FuzzPolicy> for SlotPolicy {
    fn from(policy: FuzzPolicy) -> Self {
        match policy {
            FuzzPolicy::Always => SlotPolicy::Always,
            FuzzPolicy::FirstOnly => SlotPolicy::FirstOnly,
            FuzzPolicy::Budget(limit) => SlotPolicy::Budget(limit as u64),
        }
    }
}

fn impl_id(mock: u8) -> MockImplId {
    MockImplId::new(format!("Mock{}", mock % 8))
}

fn instance_id(instance: Option<u8>) -> Option<InstanceId> {
    instance.map(|raw| InstanceId::new((raw % 4) as u64))
}

// Interleaved lifecycle, registration, zone, and dispatch operations must
// never panic as long as gated slot indexes stay within registered tables.
fuzz_target!(|ops: Vec<HarnessOp>| {
    let coordinator = TestRunCoordinator::new();
    for op in ops {
        match op {
            HarnessOp::Register {
                mock,
                instance,
                slots,
                suite_scoped,
            } => {
                let scope = if suite_scoped {
                    MockScope::Suite
                } else {
                    MockScope::Test
                };
                // Duplicate keys are a usage error, not a crash.
                let _ = coordinator.registry().register(
                    impl_id(mock),
                    instance_id(instance),
                    MockHandle::new(()),
                    slots.into_iter().take(8).map(SlotPolicy::from),
                    scope,
                );
            }
            HarnessOp::GetMock { mock, instance } => {
                let _ = coordinator.get_mock(&impl_id(mock), instance_id(instance));
            }
            HarnessOp::UpdateMockState {
                mock,
                instance,
                slot,
            } => {
                let mock_impl = impl_id(mock);
                let instance = instance_id(instance);
                let site = match slot {
                    Some(slot) => {
                        let Some(registration) =
                            coordinator.registry().resolve(&mock_impl, instance)
                        else {
                            continue;
                        };
                        let slot_count = registration.states().len();
                        if slot_count == 0 {
                            continue;
                        }
                        CallSiteKey::gated(mock_impl, instance, slot as u32 % slot_count as u32)
                    }
                    None => CallSiteKey::ungated(mock_impl, instance),
                };
                let _ = coordinator.update_mock_state(&site);
            }
            HarnessOp::EnterZone => coordinator.zone_tracker().enter(),
            HarnessOp::ExitZone => coordinator.zone_tracker().exit(),
            HarnessOp::PrepareForNextTest => {
                coordinator.prepare_for_next_test();
                assert!(coordinator.record_replay_for_running_test().is_none());
            }
            HarnessOp::FinishExecution => coordinator.finish_current_test_execution(),
            HarnessOp::Snapshot => {
                let _ = coordinator.snapshot();
            }
        }
    }
});
