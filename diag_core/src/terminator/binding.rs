//! Per-device link to one terminator.
//!
//! The `armed` latch is tracked independently of the raw use flag so that
//! arm/disarm only happen on a flag *transition*. Writing the same value
//! to `UseTerm_<name>` every tick never reopens hardware or resets timers.

use super::TerminatorSlot;
use crate::dashboard::Dashboard;
use crate::ids::TerminatorId;
use diag_common::status::StatusCode;

#[derive(Debug, Clone)]
pub struct TerminatorBinding {
    terminator: TerminatorId,
    name: String,
    use_key: String,
    default_use: bool,
    seeded: bool,
    use_flag: bool,
    armed: bool,
    last_status: StatusCode,
    last_debug: String,
}

/// What [`TerminatorBinding::sync_arming`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmChange {
    None,
    Armed,
    Disarmed,
}

impl TerminatorBinding {
    pub(crate) fn new(terminator: TerminatorId, name: &str, use_key: String, default_use: bool) -> Self {
        Self {
            terminator,
            name: name.to_string(),
            use_key,
            default_use,
            seeded: false,
            use_flag: default_use,
            armed: false,
            last_status: StatusCode::UNSET,
            last_debug: String::new(),
        }
    }

    pub fn terminator(&self) -> TerminatorId {
        self.terminator
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn use_key(&self) -> &str {
        &self.use_key
    }

    pub fn default_use(&self) -> bool {
        self.default_use
    }

    pub fn use_flag(&self) -> bool {
        self.use_flag
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn last_status(&self) -> StatusCode {
        self.last_status
    }

    pub fn last_debug(&self) -> &str {
        &self.last_debug
    }

    /// Write the attach-time default once.
    pub(crate) fn seed(&mut self, dash: &mut dyn Dashboard) {
        if !self.seeded {
            dash.put_bool(&self.use_key, self.default_use);
            self.use_flag = self.default_use;
            self.seeded = true;
        }
    }

    pub(crate) fn sample(&mut self, dash: &dyn Dashboard) {
        self.use_flag = dash.get_bool(&self.use_key, self.default_use);
    }

    /// Arm or disarm only when the use flag differs from the latch.
    pub(crate) fn sync_arming(&mut self, slots: &mut [TerminatorSlot]) -> ArmChange {
        match (self.use_flag, self.armed) {
            (true, false) => {
                slots[self.terminator.index()].arm_for_test();
                self.armed = true;
                ArmChange::Armed
            }
            (false, true) => {
                slots[self.terminator.index()].disarm_for_test();
                self.armed = false;
                ArmChange::Disarmed
            }
            _ => ArmChange::None,
        }
    }

    pub(crate) fn disarm(&mut self, slots: &mut [TerminatorSlot]) {
        if self.armed {
            slots[self.terminator.index()].disarm_for_test();
            self.armed = false;
        }
    }

    pub(crate) fn record(&mut self, status: StatusCode, debug: String) {
        self.last_status = status;
        self.last_debug = debug;
    }

    pub(crate) fn reset_observation(&mut self) {
        self.last_status = StatusCode::UNSET;
        self.last_debug.clear();
    }

    /// ` | <name> use=<0|1> armed=<0|1> last=0x%08X [debug]`
    pub(crate) fn debug_fragment(&self) -> String {
        let mut text = format!(
            " | {} use={} armed={} last={}",
            self.name,
            u8::from(self.use_flag),
            u8::from(self.armed),
            self.last_status
        );
        if !self.last_debug.is_empty() {
            text.push_str(" [");
            text.push_str(&self.last_debug);
            text.push(']');
        }
        text
    }
}
