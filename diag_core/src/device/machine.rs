//! Per-device state machine.
//!
//! One call to [`Device::tick`] per scheduler period. Order inside a tick:
//!
//! 1. seed keys (first tick only, nothing else happens)
//! 2. consume a pending `Retrying` state
//! 3. sample `Enable`, `Retry` and every `UseTerm_*` flag
//! 4. retry → disable → run gate → open / arm / poll / step
//! 5. publish
//!
//! Hardware open/close strictly alternate: every path that ends a test
//! closes the hardware, so the next test always reopens it.

use super::hooks::DeviceHooks;
use super::state::{DeviceEvent, Health, RunState, Transition, transition};
use super::{DeviceStatus, FiredBy};
use crate::dashboard::{Dashboard, DeviceKeys};
use crate::ids::{DeviceId, TerminatorId};
use crate::terminator::binding::ArmChange;
use crate::terminator::{RunSnapshot, TerminatorBinding, TerminatorSlot, TickInfo};
use diag_common::status::{StatusCode, codes, message_of};
use tracing::{debug, info, warn};

pub struct Device {
    id: DeviceId,
    name: String,
    keys: DeviceKeys,
    hooks: Box<dyn DeviceHooks>,
    state: RunState,
    hw_open: bool,
    seeded: bool,
    enabled: bool,
    status: DeviceStatus,
    bindings: Vec<TerminatorBinding>,
    selected_for_run: bool,
    active_run_id: u32,
}

impl Device {
    pub(crate) fn new(id: DeviceId, name: &str, keys: DeviceKeys, hooks: Box<dyn DeviceHooks>) -> Self {
        Self {
            id,
            name: name.to_string(),
            keys,
            hooks,
            state: RunState::Idle,
            hw_open: false,
            seeded: false,
            enabled: false,
            status: DeviceStatus::default(),
            bindings: Vec::new(),
            selected_for_run: false,
            active_run_id: 0,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn status(&self) -> &DeviceStatus {
        &self.status
    }

    pub fn health(&self) -> Health {
        Health::of(self.status.last_test_status)
    }

    pub fn bindings(&self) -> &[TerminatorBinding] {
        &self.bindings
    }

    /// `Enable` as sampled on the last tick.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_hardware_open(&self) -> bool {
        self.hw_open
    }

    pub fn is_selected_for(&self, run_id: u32) -> bool {
        self.selected_for_run && self.active_run_id == run_id
    }

    pub fn active_run_id(&self) -> u32 {
        self.active_run_id
    }

    pub fn keys(&self) -> &DeviceKeys {
        &self.keys
    }

    pub fn position_rotations(&self) -> Option<f64> {
        self.hooks.position_rotations()
    }

    /// `StatusSummary` text for the last test status.
    pub fn summary(&self) -> String {
        let last = self.status.last_test_status;
        if last.is_unset() {
            return message_of(StatusCode::UNSET);
        }
        let mut text = format!("{}: {}", last.severity().prefix(), message_of(last));
        if let Some(fired) = &self.status.fired_by {
            if fired.status == last {
                text.push_str(&format!(" (by {})", fired.name));
            }
        }
        text
    }

    /// `DebugState` line.
    pub fn debug_line(&self, run: RunSnapshot) -> String {
        let mut line = format!(
            "runActive={} runId={} sel={} state={} steps={}",
            u8::from(run.active),
            run.run_id,
            u8::from(self.is_selected_for(run.run_id)),
            self.state,
            self.status.steps
        );
        for binding in &self.bindings {
            line.push_str(&binding.debug_fragment());
        }
        let extra = self.hooks.debug_extra();
        if !extra.is_empty() {
            line.push_str(" | ");
            line.push_str(&extra);
        }
        line
    }

    pub(crate) fn is_armed_against(&self, terminator: TerminatorId) -> bool {
        self.bindings
            .iter()
            .any(|b| b.terminator() == terminator && b.is_armed())
    }

    pub(crate) fn is_bound_to(&self, terminator: TerminatorId) -> bool {
        self.bindings.iter().any(|b| b.terminator() == terminator)
    }

    pub(crate) fn attach(&mut self, binding: TerminatorBinding) {
        self.bindings.push(binding);
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Advance one scheduler period. Returns the terminator that fired for
    /// this device, if any, so the engine can broadcast it.
    pub(crate) fn tick(
        &mut self,
        dash: &mut dyn Dashboard,
        slots: &mut [TerminatorSlot],
        info: &TickInfo<'_>,
    ) -> Option<FiredBy> {
        if !self.seeded {
            self.seed(dash, info.run);
            return None;
        }
        for binding in &mut self.bindings {
            binding.seed(dash);
        }
        if self.state == RunState::Retrying {
            self.apply(DeviceEvent::RetryConsumed);
        }

        self.enabled = dash.get_bool(&self.keys.enable, false);
        let retry = dash.get_bool(&self.keys.retry, false);
        for binding in &mut self.bindings {
            binding.sample(&*dash);
        }

        if retry {
            dash.put_bool(&self.keys.retry, false);
            self.retry(slots);
            self.publish(dash, info.run);
            return None;
        }

        if !self.enabled {
            self.disable(slots);
            self.publish(dash, info.run);
            return None;
        }

        let fired = if self.gate_open(info.run) {
            self.advance(slots, info)
        } else {
            if self.state == RunState::Testing {
                info!("Device '{}' paused: not part of the active run", self.name);
                self.teardown(slots);
                self.apply(DeviceEvent::Paused);
            }
            None
        };
        self.publish(dash, info.run);
        fired
    }

    fn gate_open(&self, run: RunSnapshot) -> bool {
        run.active && self.is_selected_for(run.run_id)
    }

    fn advance(&mut self, slots: &mut [TerminatorSlot], info: &TickInfo<'_>) -> Option<FiredBy> {
        match self.state {
            RunState::Idle => {
                if !self.begin_test(info.run.run_id) {
                    return None;
                }
            }
            RunState::Testing => {}
            _ => return None,
        }

        for binding in &mut self.bindings {
            match binding.sync_arming(slots) {
                ArmChange::Armed => debug!("Device '{}' armed '{}'", self.name, binding.name()),
                ArmChange::Disarmed => {
                    debug!("Device '{}' disarmed '{}'", self.name, binding.name())
                }
                ArmChange::None => {}
            }
        }

        if let Some(fired) = self.poll_terminators(slots, info) {
            info!(
                "Device '{}' terminated by '{}': {} ({})",
                self.name,
                fired.name,
                message_of(fired.status),
                fired.status
            );
            self.status.last_test_status = fired.status;
            self.status.fired_by = Some(fired.clone());
            self.finish(slots);
            return Some(fired);
        }

        let step = self.hooks.run_test_step();
        self.status.steps += 1;
        self.status.last_test_status = step;
        if step.is_terminal() {
            warn!(
                "Device '{}' test step failed: {} ({})",
                self.name,
                message_of(step),
                step
            );
            self.finish(slots);
        }
        None
    }

    fn begin_test(&mut self, run_id: u32) -> bool {
        if !self.apply(DeviceEvent::BeginOpen) {
            return false;
        }
        self.status.ever_ran = true;
        self.status.steps = 0;

        let init = self.hooks.open_hardware();
        self.hw_open = true;
        self.status.last_init_status = init;

        if init.is_terminal() {
            warn!(
                "Device '{}' failed to open: {} ({})",
                self.name,
                message_of(init),
                init
            );
            self.status.last_test_status = init;
            self.close_hw();
            self.apply(DeviceEvent::OpenFailed);
            return false;
        }

        self.hooks.on_test_start();
        self.apply(DeviceEvent::Opened);
        info!("Device '{}' test started (run {})", self.name, run_id);
        true
    }

    /// First non-continue result in binding order wins.
    fn poll_terminators(&mut self, slots: &mut [TerminatorSlot], info: &TickInfo<'_>) -> Option<FiredBy> {
        for binding in &mut self.bindings {
            if !binding.is_armed() {
                continue;
            }
            let slot = &mut slots[binding.terminator().index()];
            let status = slot.evaluate(info);
            binding.record(status, slot.debug_text());
            if !status.is_continue() {
                return Some(FiredBy {
                    terminator: binding.terminator(),
                    name: binding.name().to_string(),
                    status,
                });
            }
        }
        None
    }

    /// Tear down and latch. Verdict comes from the last test status after
    /// teardown escalation.
    fn finish(&mut self, slots: &mut [TerminatorSlot]) {
        self.teardown(slots);
        let bad = self.status.last_test_status.is_terminal();
        self.apply(DeviceEvent::Finished { bad });
        info!(
            "Device '{}' finished {}: {}",
            self.name,
            self.state,
            self.summary()
        );
    }

    /// Disarm, stop, end and close. Safe to call in any state.
    fn teardown(&mut self, slots: &mut [TerminatorSlot]) {
        for binding in &mut self.bindings {
            binding.disarm(slots);
        }
        let was_testing = self.state == RunState::Testing;
        if self.hw_open {
            if let Err(e) = self.hooks.stop_hardware() {
                warn!("Device '{}' failed to stop: {}", self.name, e);
                self.escalate(e.status);
            }
        }
        if was_testing {
            self.hooks.on_test_end();
        }
        self.close_hw();
    }

    fn close_hw(&mut self) {
        if !self.hw_open {
            return;
        }
        self.hw_open = false;
        if let Err(e) = self.hooks.close_hardware() {
            warn!("Device '{}' failed to close: {}", self.name, e);
            self.escalate(e.status);
        }
    }

    /// Replace the last test status when `status` is more severe.
    fn escalate(&mut self, status: StatusCode) {
        let current = self.status.last_test_status;
        if current.is_unset() || status.severity() > current.severity() {
            self.status.last_test_status = status;
        }
    }

    fn apply(&mut self, event: DeviceEvent) -> bool {
        match transition(self.state, event) {
            Transition::Ok(next) => {
                if next != self.state {
                    debug!("Device '{}' {} -> {} ({:?})", self.name, self.state, next, event);
                }
                self.state = next;
                true
            }
            Transition::Rejected(reason) => {
                debug!(
                    "Device '{}' ignored {:?} in {}: {}",
                    self.name, event, self.state, reason
                );
                false
            }
        }
    }

    // ─── Operator controls ──────────────────────────────────────────

    fn retry(&mut self, slots: &mut [TerminatorSlot]) {
        info!("Device '{}' retry requested", self.name);
        self.teardown(slots);
        self.status = DeviceStatus::default();
        for binding in &mut self.bindings {
            binding.reset_observation();
        }
        self.apply(DeviceEvent::RetryRequested);
    }

    /// Leaves last status, summary and attribution for the operator.
    fn disable(&mut self, slots: &mut [TerminatorSlot]) {
        if self.selected_for_run {
            debug!("Device '{}' withdrawn from run {}", self.name, self.active_run_id);
            self.selected_for_run = false;
        }
        match self.state {
            RunState::Testing => {
                info!("Device '{}' disabled during test", self.name);
                self.teardown(slots);
            }
            RunState::CompletedGood | RunState::CompletedBad => {
                debug!("Device '{}' completion latch cleared", self.name);
            }
            _ => return,
        }
        self.apply(DeviceEvent::Disabled);
        for binding in &mut self.bindings {
            binding.reset_observation();
        }
    }

    // ─── Run coordination ───────────────────────────────────────────

    /// Snapshot selection for a new run.
    pub(crate) fn prepare_for_run(&mut self, run_id: u32, enabled: bool) {
        self.active_run_id = run_id;
        self.selected_for_run = enabled;
        if !enabled {
            return;
        }
        if self.state.is_completed() {
            self.apply(DeviceEvent::NewRun);
        }
        self.status.fired_by = None;
        for binding in &mut self.bindings {
            binding.reset_observation();
        }
    }

    /// Operator stop: latch a selected, unfinished device as aborted.
    pub(crate) fn abort_run(&mut self, slots: &mut [TerminatorSlot]) -> bool {
        if !self.selected_for_run || self.state.is_completed() {
            return false;
        }
        if self.state == RunState::Retrying {
            self.apply(DeviceEvent::RetryConsumed);
        }
        self.teardown(slots);
        self.status.last_test_status = codes::RUN_ABORTED;
        self.status.fired_by = None;
        self.apply(DeviceEvent::Finished { bad: false });
        info!("Device '{}' aborted", self.name);
        true
    }

    /// Stop request from a shared terminator fired by another device.
    pub(crate) fn terminate_from(&mut self, slots: &mut [TerminatorSlot], fired: &FiredBy) -> bool {
        if self.state != RunState::Testing {
            return false;
        }
        info!(
            "Device '{}' stopped by broadcast from '{}' ({})",
            self.name, fired.name, fired.status
        );
        if let Some(binding) = self
            .bindings
            .iter_mut()
            .find(|b| b.terminator() == fired.terminator)
        {
            binding.record(fired.status, slots[fired.terminator.index()].debug_text());
        }
        self.status.last_test_status = fired.status;
        self.status.fired_by = Some(fired.clone());
        self.finish(slots);
        true
    }

    /// External force stop. Completion latch and last result are kept.
    pub(crate) fn force_stop(&mut self, slots: &mut [TerminatorSlot]) {
        self.teardown(slots);
        self.apply(DeviceEvent::ForceStop);
    }

    // ─── Dashboard ──────────────────────────────────────────────────

    fn seed(&mut self, dash: &mut dyn Dashboard, run: RunSnapshot) {
        dash.put_bool(&self.keys.enable, false);
        dash.put_bool(&self.keys.retry, false);
        for binding in &mut self.bindings {
            binding.seed(dash);
        }
        self.enabled = false;
        self.publish(dash, run);
        dash.put_string(&self.keys.debug_state, "init");
        self.seeded = true;
        debug!("Device '{}' keys seeded", self.name);
    }

    pub(crate) fn publish(&self, dash: &mut dyn Dashboard, run: RunSnapshot) {
        let last = self.status.last_test_status;
        dash.put_string(&self.keys.last_status_hex, &last.hex());
        dash.put_string(&self.keys.health, Health::of(last).as_str());
        dash.put_string(&self.keys.summary, &self.summary());
        dash.put_string(&self.keys.state, self.state.as_str());
        dash.put_string(&self.keys.debug_state, &self.debug_line(run));
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("hw_open", &self.hw_open)
            .field("status", &self.status)
            .field("selected_for_run", &self.selected_for_run)
            .field("active_run_id", &self.active_run_id)
            .finish_non_exhaustive()
    }
}
