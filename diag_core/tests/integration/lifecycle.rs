//! Device lifecycle through operator controls.

use super::support::{Bench, DeviceRecorder};
use diag_core::prelude::*;

fn single_device(step: StatusCode) -> (Bench, DeviceRecorder, DeviceId) {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    rec.step_status.set(step);
    let dev = bench.engine.add_device("Arm", rec.hooks()).unwrap();
    bench.tick();
    bench.enable("Arm", true);
    (bench, rec, dev)
}

#[test]
fn stale_enable_cannot_auto_start_hardware() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    let dev = bench.engine.add_device("Arm", rec.hooks()).unwrap();

    // Value persisted from a previous session
    bench.enable("Arm", true);
    bench.set("StartTest", true);
    bench.ticks(3);

    assert!(!bench.flag("Arm/Enable"));
    assert!(!bench.engine.run_active());
    assert_eq!(bench.state(dev), RunState::Idle);
    assert!(rec.log.borrow().is_empty());
}

#[test]
fn disable_after_bad_preserves_result_and_retry_resets_it() {
    let (mut bench, _rec, dev) = single_device(codes::HW_FAULT);
    bench.start_run();
    assert_eq!(bench.state(dev), RunState::CompletedBad);
    let hex = bench.text("Arm/LastStatusHex");
    assert_eq!(hex, codes::HW_FAULT.hex());
    assert_eq!(bench.text("Arm/StatusSummary"), "E: hardware fault");

    bench.enable("Arm", false);
    bench.tick();
    assert_eq!(bench.text("Arm/State"), "IDLE");
    assert_eq!(bench.text("Arm/LastStatusHex"), hex);
    assert_eq!(bench.text("Arm/StatusSummary"), "E: hardware fault");
    assert_eq!(bench.text("Arm/Health"), "ERROR");

    bench.set("Arm/Retry", true);
    bench.tick();
    assert!(!bench.flag("Arm/Retry"));
    assert_eq!(bench.text("Arm/State"), "RETRY");
    assert_eq!(bench.text("Arm/LastStatusHex"), StatusCode::UNSET.hex());
    assert_eq!(bench.text("Arm/StatusSummary"), "test not run");
    assert_eq!(bench.text("Arm/Health"), "UNKNOWN");

    bench.tick();
    assert_eq!(bench.text("Arm/State"), "IDLE");
}

#[test]
fn latched_failure_never_reruns_automatically() {
    let (mut bench, rec, dev) = single_device(codes::HW_FAULT);
    bench.start_run();
    // Fault clears, device still enabled
    rec.step_status.set(codes::TEST_OK);
    bench.ticks(20);
    assert_eq!(bench.state(dev), RunState::CompletedBad);
    assert_eq!(rec.count("open"), 1);
}

#[test]
fn retry_during_a_run_reruns_the_device() {
    let mut bench = Bench::new();
    let failing = DeviceRecorder::new();
    failing.step_status.set(codes::HW_FAULT);
    let steady = DeviceRecorder::new();
    let a = bench.engine.add_device("A", failing.hooks()).unwrap();
    let b = bench.engine.add_device("B", steady.hooks()).unwrap();
    bench.tick();
    bench.enable("A", true);
    bench.enable("B", true);
    bench.start_run();
    assert_eq!(bench.state(a), RunState::CompletedBad);
    // B keeps the run active
    assert!(bench.engine.run_active());

    failing.step_status.set(codes::TEST_OK);
    bench.set("A/Retry", true);
    bench.tick();
    assert_eq!(bench.state(a), RunState::Retrying);
    bench.tick();
    bench.tick();
    assert_eq!(bench.state(a), RunState::Testing);
    assert_eq!(failing.count("open"), 2);
    assert!(failing.open_close_alternate());
    assert_eq!(bench.state(b), RunState::Testing);
}

#[test]
fn disable_while_testing_tears_down_and_withdraws() {
    let (mut bench, rec, dev) = single_device(codes::TEST_OK);
    bench.start_run();
    bench.ticks(3);
    assert!(bench.engine.device(dev).unwrap().is_hardware_open());

    bench.enable("Arm", false);
    bench.tick();
    assert_eq!(bench.state(dev), RunState::Idle);
    assert!(!bench.engine.device(dev).unwrap().is_hardware_open());
    assert_eq!(*rec.log.borrow().last().unwrap(), "close");

    // Re-enabling does not rejoin the current run
    bench.enable("Arm", true);
    bench.ticks(3);
    assert_eq!(bench.state(dev), RunState::Idle);
    assert_eq!(rec.count("open"), 1);
}

#[test]
fn open_close_alternate_across_many_runs() {
    let (mut bench, rec, _dev) = single_device(codes::TEST_OK);
    for round in 0..5 {
        bench.start_run();
        bench.ticks(3);
        if round % 2 == 0 {
            bench.stop_run();
        } else {
            bench.set("Arm/Retry", true);
            bench.ticks(2);
            bench.stop_run();
        }
        assert!(rec.open_close_alternate(), "round {round}");
    }
    assert_eq!(rec.count("open"), rec.count("close"));
}

#[test]
fn debug_state_lists_bindings() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    let dev = bench.engine.add_device("Arm", rec.hooks()).unwrap();
    let timer = bench
        .engine
        .add_terminator(TimerTerminator::new("Budget", std::time::Duration::from_secs(9)))
        .unwrap();
    bench.engine.attach(dev, timer, true).unwrap();
    bench.tick();
    assert_eq!(bench.text("Arm/DebugState"), "init");

    bench.enable("Arm", true);
    bench.start_run();
    let line = bench.text("Arm/DebugState");
    assert!(line.starts_with("runActive=1 runId=1 sel=1 state=TESTING steps=1"), "{line}");
    assert!(line.contains(&format!(
        " | Budget use=1 armed=1 last={}",
        StatusCode::TERM_CONTINUE
    )));
    assert!(line.contains("[elapsed=0.00s limit=9.00s]"));
}
