//! Property tests: reference counting and open/close pairing under
//! arbitrary operator input.

use super::support::{Bench, DeviceRecorder, TerminatorRecorder};
use diag_core::prelude::*;
use diag_core::terminator::TerminatorSlot;
use proptest::prelude::*;

proptest! {
    /// Any interleaving of per-device arm/disarm transitions opens the
    /// hardware once per 0 → 1 and closes it once per N → 0.
    #[test]
    fn arm_reference_count_pairs_open_and_close(
        ops in proptest::collection::vec((0usize..4, any::<bool>()), 0..64)
    ) {
        let term = TerminatorRecorder::new();
        let mut slot = TerminatorSlot::new(Box::new(term.terminator("Shared")));
        let mut armed = [false; 4];
        let mut zero_to_one = 0u32;
        let mut n_to_zero = 0u32;

        for (device, want) in ops {
            if want == armed[device] {
                continue;
            }
            let before = slot.arm_count();
            if want {
                slot.arm_for_test();
                if before == 0 {
                    zero_to_one += 1;
                }
            } else {
                slot.disarm_for_test();
                if before == 1 {
                    n_to_zero += 1;
                }
            }
            armed[device] = want;
            prop_assert_eq!(slot.arm_count() as usize, armed.iter().filter(|a| **a).count());
            prop_assert_eq!(slot.is_open(), slot.arm_count() > 0);
        }

        for is_armed in armed.iter_mut().filter(|a| **a) {
            slot.disarm_for_test();
            *is_armed = false;
            if slot.arm_count() == 0 {
                n_to_zero += 1;
            }
        }

        prop_assert_eq!(slot.arm_count(), 0);
        prop_assert_eq!(term.opens.get(), zero_to_one);
        prop_assert_eq!(term.closes.get(), n_to_zero);
        prop_assert_eq!(term.opens.get(), term.closes.get());
    }
}

#[derive(Debug, Clone, Copy)]
enum Input {
    Enable(bool),
    Retry,
    UseTerm(bool),
    Start,
    Stop,
    StepFault(bool),
    TermFires(bool),
    ForceStop,
    Idle,
}

fn input() -> impl Strategy<Value = Input> {
    prop_oneof![
        any::<bool>().prop_map(Input::Enable),
        Just(Input::Retry),
        any::<bool>().prop_map(Input::UseTerm),
        Just(Input::Start),
        Just(Input::Stop),
        any::<bool>().prop_map(Input::StepFault),
        any::<bool>().prop_map(Input::TermFires),
        Just(Input::ForceStop),
        Just(Input::Idle),
    ]
}

proptest! {
    /// Whatever the operator does, a device never double-opens and a shared
    /// terminator's arm count matches the armed bindings.
    #[test]
    fn device_open_close_alternate_under_operator_input(
        inputs in proptest::collection::vec(input(), 1..80)
    ) {
        let mut bench = Bench::new();
        let a = DeviceRecorder::new();
        let b = DeviceRecorder::new();
        let da = bench.engine.add_device("A", a.hooks()).unwrap();
        let db = bench.engine.add_device("B", b.hooks()).unwrap();
        let term = TerminatorRecorder::new();
        let t = bench.engine.add_terminator(term.terminator("T")).unwrap();
        bench.engine.attach(da, t, true).unwrap();
        bench.engine.attach(db, t, false).unwrap();
        bench.tick();
        bench.enable("B", true);

        for input in inputs {
            match input {
                Input::Enable(on) => bench.enable("A", on),
                Input::Retry => bench.set("A/Retry", true),
                Input::UseTerm(on) => bench.set("B/UseTerm_T", on),
                Input::Start => bench.set("StartTest", true),
                Input::Stop => bench.set("StopTest", true),
                Input::StepFault(fault) => a.step_status.set(if fault {
                    codes::HW_FAULT
                } else {
                    codes::TEST_OK
                }),
                Input::TermFires(fire) => term.fire(if fire {
                    codes::TERM_TERMINATED_OK
                } else {
                    StatusCode::TERM_CONTINUE
                }),
                Input::ForceStop => bench.engine.stop_all(),
                Input::Idle => {}
            }
            bench.tick();
            bench.set("StartTest", false);
            bench.set("StopTest", false);

            prop_assert!(a.open_close_alternate());
            prop_assert!(b.open_close_alternate());

            let armed = bench
                .engine
                .devices()
                .iter()
                .flat_map(|d| d.bindings())
                .filter(|binding| binding.is_armed())
                .count();
            let slot = bench.engine.terminator(t).unwrap();
            prop_assert_eq!(slot.arm_count() as usize, armed);
            prop_assert!(term.opens.get() >= term.closes.get());
            prop_assert!(term.opens.get() - term.closes.get() <= 1);
        }

        bench.engine.stop_all();
        prop_assert_eq!(a.count("open"), a.count("close"));
        prop_assert_eq!(b.count("open"), b.count("close"));
        prop_assert_eq!(term.opens.get(), term.closes.get());
    }
}
