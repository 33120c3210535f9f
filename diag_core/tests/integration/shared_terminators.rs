//! Shared terminators: reference counting, edge-triggered use flags,
//! broadcast and fault isolation.

use super::support::{Bench, DeviceRecorder, Level, TerminatorRecorder};
use diag_core::prelude::*;
use std::time::Duration;

struct Pair {
    bench: Bench,
    a: DeviceId,
    b: DeviceId,
    t: TerminatorId,
    term: TerminatorRecorder,
    rec_b: DeviceRecorder,
}

fn pair(default_use_b: bool) -> Pair {
    let mut bench = Bench::new();
    let rec_a = DeviceRecorder::new();
    let rec_b = DeviceRecorder::new();
    let a = bench.engine.add_device("A", rec_a.hooks()).unwrap();
    let b = bench.engine.add_device("B", rec_b.hooks()).unwrap();
    let term = TerminatorRecorder::new();
    let t = bench.engine.add_terminator(term.terminator("Shared")).unwrap();
    bench.engine.attach(a, t, true).unwrap();
    bench.engine.attach(b, t, default_use_b).unwrap();
    bench.tick();
    bench.enable("A", true);
    bench.enable("B", true);
    Pair {
        bench,
        a,
        b,
        t,
        term,
        rec_b,
    }
}

#[test]
fn shared_terminator_opens_once_for_many_devices() {
    let mut p = pair(true);
    p.bench.start_run();
    p.bench.ticks(10);
    assert_eq!(p.term.opens.get(), 1);
    assert_eq!(p.bench.engine.terminator(p.t).unwrap().arm_count(), 2);

    p.bench.enable("A", false);
    p.bench.tick();
    assert_eq!(p.term.closes.get(), 0);
    p.bench.enable("B", false);
    p.bench.tick();
    assert_eq!(p.term.closes.get(), 1);
    assert!(!p.bench.engine.terminator(p.t).unwrap().is_open());
}

#[test]
fn rewriting_the_same_use_flag_does_not_rearm() {
    let mut p = pair(true);
    p.bench.start_run();
    for _ in 0..20 {
        p.bench.set("A/UseTerm_Shared", true);
        p.bench.set("B/UseTerm_Shared", true);
        p.bench.tick();
    }
    assert_eq!(p.term.opens.get(), 1);
    assert_eq!(p.term.closes.get(), 0);
    assert_eq!(p.bench.engine.terminator(p.t).unwrap().arm_count(), 2);
}

#[test]
fn use_flag_transitions_arm_and_disarm() {
    let mut p = pair(false);
    p.bench.enable("A", false);
    p.bench.start_run();
    assert_eq!(p.term.opens.get(), 0);

    p.bench.set("B/UseTerm_Shared", true);
    p.bench.tick();
    assert_eq!(p.term.opens.get(), 1);

    p.bench.set("B/UseTerm_Shared", false);
    p.bench.ticks(3);
    assert_eq!(p.term.closes.get(), 1);

    p.bench.set("B/UseTerm_Shared", true);
    p.bench.tick();
    assert_eq!(p.term.opens.get(), 2);
    assert_eq!(p.bench.state(p.b), RunState::Testing);
}

#[test]
fn broadcast_skips_devices_not_armed_against_the_terminator() {
    let mut p = pair(false);
    p.bench.start_run();
    p.term.fire(codes::TERM_TERMINATED_OK);
    p.bench.tick();

    assert_eq!(p.bench.state(p.a), RunState::CompletedGood);
    assert_eq!(p.bench.state(p.b), RunState::Testing);
    assert!(p.rec_b.count("step") >= 2);
}

#[test]
fn broadcast_fires_once_per_arm_session() {
    let mut p = pair(true);
    p.bench.start_run();
    p.term.fire(codes::TERM_TERMINATED_OK);
    p.bench.tick();
    assert_eq!(p.bench.state(p.a), RunState::CompletedGood);
    assert_eq!(p.bench.state(p.b), RunState::CompletedGood);
    // Only the polling device evaluated the terminator
    assert_eq!(p.term.evaluations.get(), 2 + 1);
    assert_eq!(p.term.closes.get(), 1);
}

#[test]
fn evaluation_fault_fires_bad_and_reinitialises_on_next_arm() {
    let mut p = pair(true);
    p.bench.start_run();
    p.term.fail(HookError::fault("encoder cable"));
    p.bench.tick();

    assert_eq!(p.bench.state(p.a), RunState::CompletedBad);
    assert_eq!(p.bench.state(p.b), RunState::CompletedBad);
    assert_eq!(p.bench.status(p.a).last_test_status, codes::HW_FAULT);
    let slot = p.bench.engine.terminator(p.t).unwrap();
    assert!(!slot.is_open());
    assert_eq!(slot.arm_count(), 0);
    assert_eq!(p.term.closes.get(), 1);

    p.term.fire(StatusCode::TERM_CONTINUE);
    p.bench.start_run();
    assert_eq!(p.term.opens.get(), 2);
    assert_eq!(p.bench.state(p.a), RunState::Testing);
}

#[test]
fn limit_switch_device_stops_motor_without_its_own_enable() {
    let mut bench = Bench::new();
    let level = Level::default();
    let (switch_dev, switch_term) = bench
        .engine
        .add_device_terminator(DigitalStateTerminator::new("Limit", Box::new(level.clone())))
        .unwrap();
    let motor = DeviceRecorder::new();
    let m = bench.engine.add_device("Motor", motor.hooks()).unwrap();
    bench.engine.attach(m, switch_term, true).unwrap();
    bench.tick();

    // The switch device itself stays disabled
    bench.enable("Motor", true);
    bench.start_run();
    bench.ticks(3);
    assert_eq!(bench.state(m), RunState::Testing);
    assert_eq!(bench.state(switch_dev), RunState::Idle);

    level.0.set(true);
    bench.tick();
    assert_eq!(bench.state(m), RunState::CompletedGood);
    assert!(bench.text("Motor/StatusSummary").ends_with("(by Limit)"));
    assert!(bench.text("Motor/DebugState").contains("[raw=1 pressed=1]"));
}

#[test]
fn limit_switch_self_test_runs_as_a_device() {
    let mut bench = Bench::new();
    let level = Level::default();
    let (switch_dev, _) = bench
        .engine
        .add_device_terminator(DigitalStateTerminator::new("Limit", Box::new(level)))
        .unwrap();
    bench.tick();
    bench.enable("Limit", true);
    bench.start_run();
    bench.ticks(2);
    assert_eq!(bench.state(switch_dev), RunState::Testing);
    assert_eq!(bench.text("Limit/Health"), "GOOD");
    assert!(bench.text("Limit/DebugState").ends_with("| raw=0 pressed=0"));
}

#[test]
fn delta_snapshot_is_taken_per_run() {
    let mut bench = Bench::new();
    let rec = DeviceRecorder::new();
    rec.position.set(Some(10.0));
    let dev = bench.engine.add_device("Spool", rec.hooks()).unwrap();
    let delta = bench.engine.add_terminator(DeltaTerminator::new("Turn", 0.25)).unwrap();
    bench.engine.attach(dev, delta, true).unwrap();
    bench.tick();
    bench.enable("Spool", true);

    bench.start_run();
    rec.position.set(Some(10.2));
    bench.tick();
    assert_eq!(bench.state(dev), RunState::Testing);
    rec.position.set(Some(10.3));
    bench.tick();
    assert_eq!(bench.state(dev), RunState::CompletedGood);
    assert_eq!(bench.text("Spool/StatusSummary"), "G: rotation delta reached (by Turn)");

    // Next run measures from where the mechanism stopped
    bench.start_run();
    bench.ticks(3);
    assert_eq!(bench.state(dev), RunState::Testing);
}

#[test]
fn run_start_timer_stops_all_devices_together() {
    let mut bench = Bench::new();
    let a = bench.engine.add_device("A", DeviceRecorder::new().hooks()).unwrap();
    let b = bench.engine.add_device("B", DeviceRecorder::new().hooks()).unwrap();
    let timer = bench
        .engine
        .add_terminator(
            TimerTerminator::new("RunBudget", Duration::from_millis(500))
                .with_epoch(TimerEpoch::RunStart),
        )
        .unwrap();
    bench.engine.attach(a, timer, true).unwrap();
    bench.engine.attach(b, timer, true).unwrap();
    bench.tick();
    bench.enable("A", true);
    bench.enable("B", true);
    bench.start_run();

    bench.ticks(24);
    assert_eq!(bench.state(a), RunState::Testing);
    bench.tick();
    assert_eq!(bench.state(a), RunState::CompletedGood);
    assert_eq!(bench.state(b), RunState::CompletedGood);
    assert!(!bench.engine.run_active());
}
