//! Run coordination.
//!
//! Starts and stops all devices together. `StartTest` and `StopTest` are
//! one-shot buttons: each triggers on a rising edge and must go low before
//! it can trigger again. Every start stamps a new, strictly increasing run
//! id and snapshots which devices take part.

use crate::dashboard::{Dashboard, KeySpace, RunKeys};
use crate::device::Device;
use crate::terminator::{RunSnapshot, TerminatorSlot};
use std::time::Duration;
use tracing::{debug, info};

/// Run-level outcome of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    Started { run_id: u32, selected: usize },
    Aborted { run_id: u32, aborted: usize },
    Completed { run_id: u32 },
}

#[derive(Debug)]
pub struct RunCoordinator {
    keys: RunKeys,
    seeded: bool,
    run_active: bool,
    run_id: u32,
    run_start: Option<Duration>,
    start_was_high: bool,
    stop_was_high: bool,
}

impl RunCoordinator {
    pub fn new(space: &KeySpace) -> Self {
        Self {
            keys: RunKeys::new(space),
            seeded: false,
            run_active: false,
            run_id: 0,
            run_start: None,
            start_was_high: false,
            stop_was_high: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.run_active
    }

    pub fn run_id(&self) -> u32 {
        self.run_id
    }

    pub fn run_start(&self) -> Option<Duration> {
        self.run_start
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            active: self.run_active,
            run_id: self.run_id,
            started_at: self.run_start,
        }
    }

    pub fn keys(&self) -> &RunKeys {
        &self.keys
    }

    /// Handle the start and stop buttons. Stop wins when both rise together.
    pub fn poll_start_stop_requests(
        &mut self,
        dash: &mut dyn Dashboard,
        devices: &mut [Device],
        slots: &mut [TerminatorSlot],
        now: Duration,
    ) -> Option<RunEvent> {
        if !self.seeded {
            self.seed(dash);
        }

        let start = dash.get_bool(&self.keys.start_test, false);
        let stop = dash.get_bool(&self.keys.stop_test, false);
        let start_edge = start && !self.start_was_high;
        let stop_edge = stop && !self.stop_was_high;
        self.start_was_high = start;
        self.stop_was_high = stop;

        if stop_edge && self.run_active {
            return Some(self.stop_run(dash, devices, slots));
        }
        if start_edge && !self.run_active {
            return Some(self.start_run(dash, devices, now));
        }
        if start_edge || stop_edge {
            debug!(
                "Ignored run button (start={}, stop={}, active={})",
                start_edge, stop_edge, self.run_active
            );
        }
        None
    }

    fn start_run(&mut self, dash: &mut dyn Dashboard, devices: &mut [Device], now: Duration) -> RunEvent {
        self.run_id = self.run_id.wrapping_add(1).max(1);
        self.run_active = true;
        self.run_start = Some(now);

        let mut selected = 0;
        for device in devices.iter_mut() {
            let enabled = dash.get_bool(&device.keys().enable, false);
            device.prepare_for_run(self.run_id, enabled);
            if enabled {
                selected += 1;
            }
        }
        self.publish(dash);
        info!(
            "Run {} started at {:.3}s with {} selected device(s)",
            self.run_id,
            now.as_secs_f64(),
            selected
        );
        RunEvent::Started {
            run_id: self.run_id,
            selected,
        }
    }

    fn stop_run(
        &mut self,
        dash: &mut dyn Dashboard,
        devices: &mut [Device],
        slots: &mut [TerminatorSlot],
    ) -> RunEvent {
        self.run_active = false;
        let snapshot = self.snapshot();
        let mut aborted = 0;
        for device in devices.iter_mut() {
            if device.abort_run(slots) {
                device.publish(dash, snapshot);
                aborted += 1;
            }
        }
        self.publish(dash);
        info!("Run {} stopped by operator, {} device(s) aborted", self.run_id, aborted);
        RunEvent::Aborted {
            run_id: self.run_id,
            aborted,
        }
    }

    /// Clear `runActive` once every selected device has completed. A run
    /// with no selected devices stays active until stopped.
    pub fn auto_end_run_if_complete(&mut self, dash: &mut dyn Dashboard, devices: &[Device]) -> Option<RunEvent> {
        if !self.run_active {
            return None;
        }
        let mut selected = devices.iter().filter(|d| d.is_selected_for(self.run_id)).peekable();
        if selected.peek().is_none() {
            return None;
        }
        if !selected.all(|d| d.state().is_completed()) {
            return None;
        }
        self.run_active = false;
        self.publish(dash);
        info!("Run {} complete", self.run_id);
        Some(RunEvent::Completed { run_id: self.run_id })
    }

    /// External force stop: the run ends without latching any device.
    pub fn force_stop(&mut self, dash: &mut dyn Dashboard) {
        if self.run_active {
            info!("Run {} force-stopped", self.run_id);
        }
        self.run_active = false;
        self.publish(dash);
    }

    pub fn publish(&self, dash: &mut dyn Dashboard) {
        dash.put_number(&self.keys.run_id, f64::from(self.run_id));
        dash.put_bool(&self.keys.run_active, self.run_active);
        dash.put_number(
            &self.keys.run_start_time_sec,
            self.run_start.map_or(0.0, |t| t.as_secs_f64()),
        );
    }

    fn seed(&mut self, dash: &mut dyn Dashboard) {
        dash.put_bool(&self.keys.start_test, false);
        dash.put_bool(&self.keys.stop_test, false);
        self.publish(dash);
        self.seeded = true;
        debug!("Run keys seeded under '{}'", self.keys.run_id);
    }
}
