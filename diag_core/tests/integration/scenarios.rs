//! End-to-end bench scenarios.

use super::support::{Bench, DeviceRecorder, PERIOD, TerminatorRecorder};
use diag_core::prelude::*;
use std::time::Duration;

#[test]
fn steady_device_without_terminators_reports_good_while_testing() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    let dev = bench.engine.add_device("Intake", rec.hooks()).unwrap();

    bench.tick();
    bench.enable("Intake", true);
    bench.start_run();
    bench.ticks(50);

    assert_eq!(bench.text("Intake/Health"), "GOOD");
    assert_eq!(bench.text("Intake/State"), "TESTING");
    assert_eq!(bench.state(dev), RunState::Testing);
    assert_eq!(rec.count("open"), 1);
    assert_eq!(rec.count("step"), 51);
}

#[test]
fn timer_only_terminates_once_its_use_flag_is_set() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    let dev = bench.engine.add_device("Shooter", rec.hooks()).unwrap();
    let timer = bench
        .engine
        .add_terminator(TimerTerminator::new("Timer", Duration::from_secs(2)))
        .unwrap();
    bench.engine.attach(dev, timer, false).unwrap();

    bench.tick();
    assert!(!bench.flag("Shooter/UseTerm_Timer"));
    bench.enable("Shooter", true);
    bench.start_run();

    // Well past 2.0 s with the flag off
    bench.ticks(150);
    assert_eq!(bench.state(dev), RunState::Testing);
    assert_eq!(bench.engine.terminator(timer).unwrap().arm_count(), 0);

    bench.set("Shooter/UseTerm_Timer", true);
    let armed_at = bench.now();
    let mut fired_at = None;
    for _ in 0..200 {
        let at = bench.now();
        bench.tick();
        if bench.state(dev).is_completed() {
            fired_at = Some(at);
            break;
        }
    }

    let fired_at = fired_at.expect("timer never fired");
    let elapsed = fired_at - armed_at;
    assert!(elapsed >= Duration::from_secs(2), "fired after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2) + 2 * PERIOD);
    assert_eq!(bench.state(dev), RunState::CompletedGood);
    assert!(bench.text("Shooter/StatusSummary").ends_with("(by Timer)"));
    assert_eq!(
        bench.text("Shooter/StatusSummary"),
        "G: test terminated by terminator (ok) (by Timer)"
    );
}

fn shared_position_bench(fire_status: Option<StatusCode>) -> (Bench, DeviceRecorder, DeviceId, DeviceId) {
    let mut bench = Bench::new();
    let rec_a = DeviceRecorder::new();
    let rec_b = DeviceRecorder::new();
    rec_a.position.set(Some(0.0));
    rec_b.position.set(Some(0.0));
    let a = bench.engine.add_device("A", rec_a.hooks()).unwrap();
    let b = bench.engine.add_device("B", rec_b.hooks()).unwrap();

    let mut limit = PositionTerminator::new("Pos", 5.0);
    if let Some(status) = fire_status {
        limit = limit.with_status(status);
    }
    let pos = bench.engine.add_terminator(limit).unwrap();
    bench.engine.attach(a, pos, true).unwrap();
    bench.engine.attach(b, pos, true).unwrap();

    bench.tick();
    bench.enable("A", true);
    bench.enable("B", true);
    bench.start_run();
    bench.ticks(5);
    (bench, rec_a, a, b)
}

#[test]
fn shared_position_limit_stops_both_devices_in_one_tick() {
    let (mut bench, rec_a, a, b) = shared_position_bench(None);
    assert_eq!(bench.state(a), RunState::Testing);
    assert_eq!(bench.state(b), RunState::Testing);

    rec_a.position.set(Some(5.0));
    bench.tick();

    assert_eq!(bench.state(a), RunState::CompletedGood);
    assert_eq!(bench.state(b), RunState::CompletedGood);
    for name in ["A", "B"] {
        assert_eq!(bench.text(&format!("{name}/Health")), "WARNING");
        assert_eq!(
            bench.text(&format!("{name}/StatusSummary")),
            "W: position limit reached (by Pos)"
        );
    }
    assert!(!bench.engine.run_active());
}

#[test]
fn shared_position_limit_with_error_severity_latches_bad() {
    let (mut bench, rec_a, a, b) = shared_position_bench(Some(codes::TERM_TERMINATED_BAD));
    rec_a.position.set(Some(-5.5));
    bench.tick();

    assert_eq!(bench.state(a), RunState::CompletedBad);
    assert_eq!(bench.state(b), RunState::CompletedBad);
    assert_eq!(bench.text("B/State"), "FINISHED_BAD");
}

#[test]
fn fatal_open_finishes_bad_without_testing() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    rec.open_status.set(StatusCode::pack(
        Severity::Fatal,
        Facility::new(1),
        12,
        0,
    ));
    let dev = bench.engine.add_device("Climber", rec.hooks()).unwrap();

    bench.tick();
    bench.enable("Climber", true);
    bench.start_run();

    assert_eq!(bench.state(dev), RunState::CompletedBad);
    assert_eq!(bench.text("Climber/State"), "FINISHED_BAD");
    assert_eq!(bench.text("Climber/Health"), "ERROR");
    assert!(bench.status(dev).ever_ran);
    assert_eq!(rec.count("step"), 0);
    assert_eq!(*rec.log.borrow(), vec!["open", "close"]);

    // Stays latched
    bench.ticks(10);
    assert_eq!(rec.count("open"), 1);
}

#[test]
fn broadcast_stops_dependent_that_did_not_poll() {
    let mut bench = Bench::new();
    let rec_a = DeviceRecorder::new();
    let rec_b = DeviceRecorder::new();
    let a = bench.engine.add_device("A", rec_a.hooks()).unwrap();
    let b = bench.engine.add_device("B", rec_b.hooks()).unwrap();
    let term = TerminatorRecorder::new();
    let t = bench.engine.add_terminator(term.terminator("Guard")).unwrap();
    bench.engine.attach(a, t, true).unwrap();
    bench.engine.attach(b, t, true).unwrap();

    bench.tick();
    bench.enable("A", true);
    bench.enable("B", true);
    bench.start_run();
    assert_eq!(term.opens.get(), 1);
    assert_eq!(bench.engine.terminator(t).unwrap().arm_count(), 2);

    term.fire(codes::TERM_TERMINATED_OK);
    let evaluations = term.evaluations.get();
    let b_steps = rec_b.count("step");
    bench.tick();

    // Only A polled; B was stopped by the broadcast in the same tick
    assert_eq!(term.evaluations.get(), evaluations + 1);
    assert_eq!(rec_b.count("step"), b_steps);
    assert_eq!(bench.state(a), RunState::CompletedGood);
    assert_eq!(bench.state(b), RunState::CompletedGood);
    assert_eq!(
        bench.status(b).fired_by.map(|f| f.name),
        Some("Guard".to_string())
    );
    assert_eq!(term.closes.get(), 1);
    assert_eq!(bench.engine.terminator(t).unwrap().arm_count(), 0);
    assert!(rec_b.open_close_alternate());
}
