//! Recording doubles and a tick-driven bench around `DiagEngine`.

#![allow(dead_code)]

use diag_core::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

pub const PERIOD: Duration = Duration::from_millis(20);

// ─── Devices ────────────────────────────────────────────────────────

/// Handle to a scripted device: scripts its results, records its calls.
#[derive(Clone)]
pub struct DeviceRecorder {
    pub log: Rc<RefCell<Vec<&'static str>>>,
    pub open_status: Rc<Cell<StatusCode>>,
    pub step_status: Rc<Cell<StatusCode>>,
    pub position: Rc<Cell<Option<f64>>>,
}

impl DeviceRecorder {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            open_status: Rc::new(Cell::new(codes::INIT_OK)),
            step_status: Rc::new(Cell::new(codes::TEST_OK)),
            position: Rc::new(Cell::new(None)),
        }
    }

    pub fn hooks(&self) -> ScriptedDevice {
        ScriptedDevice(self.clone())
    }

    pub fn count(&self, call: &str) -> usize {
        self.log.borrow().iter().filter(|c| **c == call).count()
    }

    /// Opens and closes strictly alternate, starting with an open.
    pub fn open_close_alternate(&self) -> bool {
        let mut open = false;
        for call in self.log.borrow().iter() {
            match *call {
                "open" if open => return false,
                "open" => open = true,
                "close" if !open => return false,
                "close" => open = false,
                _ => {}
            }
        }
        true
    }
}

pub struct ScriptedDevice(DeviceRecorder);

impl DeviceHooks for ScriptedDevice {
    fn open_hardware(&mut self) -> StatusCode {
        self.0.log.borrow_mut().push("open");
        self.0.open_status.get()
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        self.0.log.borrow_mut().push("close");
        Ok(())
    }

    fn run_test_step(&mut self) -> StatusCode {
        self.0.log.borrow_mut().push("step");
        self.0.step_status.get()
    }

    fn stop_hardware(&mut self) -> Result<(), HookError> {
        self.0.log.borrow_mut().push("stop");
        Ok(())
    }

    fn position_rotations(&self) -> Option<f64> {
        self.0.position.get()
    }
}

// ─── Terminators ────────────────────────────────────────────────────

/// Handle to a scripted terminator.
#[derive(Clone)]
pub struct TerminatorRecorder {
    pub opens: Rc<Cell<u32>>,
    pub closes: Rc<Cell<u32>>,
    pub evaluations: Rc<Cell<u32>>,
    pub result: Rc<RefCell<Result<StatusCode, HookError>>>,
}

impl TerminatorRecorder {
    pub fn new() -> Self {
        Self {
            opens: Rc::new(Cell::new(0)),
            closes: Rc::new(Cell::new(0)),
            evaluations: Rc::new(Cell::new(0)),
            result: Rc::new(RefCell::new(Ok(StatusCode::TERM_CONTINUE))),
        }
    }

    pub fn terminator(&self, name: &str) -> ScriptedTerminator {
        ScriptedTerminator {
            name: name.to_string(),
            rec: self.clone(),
        }
    }

    pub fn fire(&self, status: StatusCode) {
        *self.result.borrow_mut() = Ok(status);
    }

    pub fn fail(&self, error: HookError) {
        *self.result.borrow_mut() = Err(error);
    }
}

pub struct ScriptedTerminator {
    name: String,
    rec: TerminatorRecorder,
}

impl Terminator for ScriptedTerminator {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_hardware(&mut self) -> Result<(), HookError> {
        self.rec.opens.set(self.rec.opens.get() + 1);
        Ok(())
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        self.rec.closes.set(self.rec.closes.get() + 1);
        Ok(())
    }

    fn evaluate(&mut self, _ctx: &EvalContext<'_>) -> Result<StatusCode, HookError> {
        self.rec.evaluations.set(self.rec.evaluations.get() + 1);
        self.rec.result.borrow().clone()
    }
}

/// Digital channel whose level is set from the test.
#[derive(Clone, Default)]
pub struct Level(pub Rc<Cell<bool>>);

impl DigitalInput for Level {
    fn open(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    fn read(&mut self) -> Result<bool, HookError> {
        Ok(self.0.get())
    }

    fn close(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

// ─── Bench ──────────────────────────────────────────────────────────

/// Engine plus a simulated clock advancing one period per tick.
pub struct Bench {
    pub engine: DiagEngine<MemoryDashboard>,
    now: Duration,
}

impl Bench {
    pub fn new() -> Self {
        Self {
            engine: DiagEngine::new(MemoryDashboard::new()),
            now: Duration::ZERO,
        }
    }

    /// Timestamp the next tick will use.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn tick(&mut self) -> Option<RunEvent> {
        let event = self.engine.periodic(self.now);
        self.now += PERIOD;
        event
    }

    pub fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn set(&mut self, key: &str, value: bool) {
        self.engine
            .dashboard_mut()
            .put_bool(&format!("Diag/{key}"), value);
    }

    pub fn flag(&self, key: &str) -> bool {
        self.engine
            .dashboard()
            .get_bool(&format!("Diag/{key}"), false)
    }

    pub fn text(&self, key: &str) -> String {
        self.engine
            .dashboard()
            .get_string(&format!("Diag/{key}"), "")
    }

    pub fn number(&self, key: &str) -> f64 {
        self.engine
            .dashboard()
            .get_number(&format!("Diag/{key}"), f64::NAN)
    }

    pub fn enable(&mut self, device: &str, on: bool) {
        self.set(&format!("{device}/Enable"), on);
    }

    /// Press and release `StartTest`; the press tick also ticks devices.
    pub fn start_run(&mut self) -> Option<RunEvent> {
        self.set("StartTest", true);
        let event = self.tick();
        self.set("StartTest", false);
        event
    }

    pub fn stop_run(&mut self) -> Option<RunEvent> {
        self.set("StopTest", true);
        let event = self.tick();
        self.set("StopTest", false);
        event
    }

    pub fn state(&self, device: DeviceId) -> RunState {
        self.engine
            .device(device)
            .map(|d| d.state())
            .unwrap_or_default()
    }

    pub fn status(&self, device: DeviceId) -> DeviceStatus {
        self.engine
            .device(device)
            .map(|d| d.status().clone())
            .unwrap_or_default()
    }
}
