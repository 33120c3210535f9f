//! Run start/stop, selection snapshots and auto end.

use super::support::{Bench, DeviceRecorder, TerminatorRecorder};
use diag_core::prelude::*;
use std::time::Duration;

#[test]
fn start_selects_only_enabled_devices() {
    let mut bench = Bench::new();
    let on = DeviceRecorder::new();
    let off = DeviceRecorder::new();
    let a = bench.engine.add_device("On", on.hooks()).unwrap();
    let b = bench.engine.add_device("Off", off.hooks()).unwrap();
    bench.tick();
    bench.enable("On", true);

    assert_eq!(
        bench.start_run(),
        Some(RunEvent::Started { run_id: 1, selected: 1 })
    );
    assert!(bench.engine.device(a).unwrap().is_selected_for(1));
    assert!(!bench.engine.device(b).unwrap().is_selected_for(1));

    // Enabling after the snapshot does not join the run
    bench.enable("Off", true);
    bench.ticks(5);
    assert_eq!(bench.state(b), RunState::Idle);
    assert!(off.log.borrow().is_empty());
    assert_eq!(bench.number("RunId"), 1.0);
    assert!(bench.flag("RunActive"));
}

#[test]
fn stop_aborts_unfinished_devices() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    let dev = bench.engine.add_device("Lift", rec.hooks()).unwrap();
    bench.tick();
    bench.enable("Lift", true);
    bench.start_run();
    bench.ticks(4);

    assert_eq!(
        bench.stop_run(),
        Some(RunEvent::Aborted { run_id: 1, aborted: 1 })
    );
    assert_eq!(bench.state(dev), RunState::CompletedGood);
    assert_eq!(bench.status(dev).last_test_status, codes::RUN_ABORTED);
    assert_eq!(bench.text("Lift/StatusSummary"), "W: run aborted by operator");
    assert_eq!(bench.text("Lift/Health"), "WARNING");
    assert!(!bench.flag("RunActive"));
    assert!(rec.open_close_alternate());
    assert_eq!(rec.count("open"), rec.count("close"));
}

#[test]
fn run_auto_ends_when_every_selected_device_completed() {
    let mut bench = Bench::new();
    let fast = DeviceRecorder::new();
    let slow = DeviceRecorder::new();
    let a = bench.engine.add_device("Fast", fast.hooks()).unwrap();
    let b = bench.engine.add_device("Slow", slow.hooks()).unwrap();
    let term = TerminatorRecorder::new();
    let t = bench.engine.add_terminator(term.terminator("Gate")).unwrap();
    bench.engine.attach(a, t, true).unwrap();
    bench.tick();
    bench.enable("Fast", true);
    bench.enable("Slow", true);
    bench.start_run();

    term.fire(codes::TERM_TERMINATED_OK);
    assert_eq!(bench.tick(), None);
    assert_eq!(bench.state(a), RunState::CompletedGood);
    assert!(bench.engine.run_active());

    slow.step_status.set(codes::HW_FAULT);
    assert_eq!(bench.tick(), Some(RunEvent::Completed { run_id: 1 }));
    assert_eq!(bench.state(b), RunState::CompletedBad);
    assert!(!bench.flag("RunActive"));
}

#[test]
fn run_without_selected_devices_stays_active() {
    let mut bench = Bench::new();
    bench.engine.add_device("Idle", DeviceRecorder::new().hooks()).unwrap();
    bench.tick();
    bench.start_run();
    bench.ticks(10);
    assert!(bench.engine.run_active());
    bench.stop_run();
    assert!(!bench.engine.run_active());
}

#[test]
fn new_run_clears_latch_and_attribution() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    let dev = bench.engine.add_device("Wrist", rec.hooks()).unwrap();
    let term = TerminatorRecorder::new();
    let t = bench.engine.add_terminator(term.terminator("Stop")).unwrap();
    bench.engine.attach(dev, t, true).unwrap();
    bench.tick();
    bench.enable("Wrist", true);

    term.fire(codes::TERM_TERMINATED_OK);
    bench.start_run();
    assert_eq!(bench.state(dev), RunState::CompletedGood);
    assert!(bench.status(dev).fired_by.is_some());
    assert!(!bench.engine.run_active());

    term.fire(StatusCode::TERM_CONTINUE);
    assert_eq!(
        bench.start_run(),
        Some(RunEvent::Started { run_id: 2, selected: 1 })
    );
    assert_eq!(bench.state(dev), RunState::Testing);
    assert_eq!(bench.status(dev).fired_by, None);
    assert_eq!(rec.count("open"), 2);
    assert_eq!(term.opens.get(), 2);
    assert_eq!(bench.text("Wrist/StatusSummary"), "G: test ok");
}

#[test]
fn run_start_time_is_published() {
    let mut bench = Bench::new();
    bench.ticks(10);
    let start = bench.now();
    bench.start_run();
    assert_eq!(bench.number("RunStartTimeSec"), start.as_secs_f64());
    assert_eq!(
        bench.engine.coordinator().run_start(),
        Some(Duration::from_millis(200))
    );
}

#[test]
fn stop_all_returns_testing_devices_to_idle_and_keeps_latches() {
    let mut bench = Bench::new();
    let running = DeviceRecorder::new();
    let failed = DeviceRecorder::new();
    failed.step_status.set(codes::HW_FAULT);
    let a = bench.engine.add_device("Running", running.hooks()).unwrap();
    let b = bench.engine.add_device("Failed", failed.hooks()).unwrap();
    let term = TerminatorRecorder::new();
    let t = bench.engine.add_terminator(term.terminator("Guard")).unwrap();
    bench.engine.attach(a, t, true).unwrap();
    bench.tick();
    bench.enable("Running", true);
    bench.enable("Failed", true);
    bench.start_run();
    assert_eq!(term.opens.get(), 1);

    bench.engine.stop_all();

    assert!(!bench.engine.run_active());
    assert_eq!(bench.state(a), RunState::Idle);
    assert!(!bench.engine.device(a).unwrap().is_hardware_open());
    assert_eq!(term.closes.get(), 1);
    assert_eq!(bench.engine.terminator(t).unwrap().arm_count(), 0);
    assert_eq!(bench.state(b), RunState::CompletedBad);
    assert_eq!(bench.text("Failed/StatusSummary"), "E: hardware fault");
    assert_eq!(bench.text("Running/Health"), "GOOD");
    assert!(running.open_close_alternate());
}
