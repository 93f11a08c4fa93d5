#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mockrun::NoMockingZoneTracker;

#[derive(Arbitrary, Debug, Clone, Copy)]
enum ZoneOp {
    Enter,
    Exit,
    Clear,
}

// Any operation sequence must keep is_inside() equal to "running signed net
// since the last clear > 0", and must never panic.
fuzz_target!(|ops: Vec<ZoneOp>| {
    let tracker = NoMockingZoneTracker::new();
    let mut net: i64 = 0;
    for op in ops {
        match op {
            ZoneOp::Enter => {
                tracker.enter();
                net += 1;
            }
            ZoneOp::Exit => {
                tracker.exit();
                net -= 1;
            }
            ZoneOp::Clear => {
                tracker.clear();
                net = 0;
            }
        }
        assert_eq!(tracker.current_net(), net);
        assert_eq!(tracker.is_inside(), net > 0);
    }
});
