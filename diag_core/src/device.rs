//! Device under test.
//!
//! This module contains:
//! - [`hooks`] - the hardware hook trait a device family implements
//! - [`state`] - run states, lifecycle events and the transition table
//! - [`machine`] - the per-device state machine driven once per tick

pub mod hooks;
pub mod machine;
pub mod state;

pub use hooks::DeviceHooks;
pub use machine::Device;
pub use state::{DeviceEvent, Health, RunState, Transition, transition};

use crate::ids::TerminatorId;
use diag_common::status::StatusCode;
use serde::Serialize;

/// Terminator that ended a test, with the status it fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiredBy {
    pub terminator: TerminatorId,
    pub name: String,
    pub status: StatusCode,
}

/// Operator-visible results of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    pub last_init_status: StatusCode,
    pub last_test_status: StatusCode,
    /// An open was attempted since the last retry.
    pub ever_ran: bool,
    /// Cleared when a new run selects the device and on retry.
    pub fired_by: Option<FiredBy>,
    /// Test steps run in the current test.
    pub steps: u64,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self {
            last_init_status: StatusCode::UNSET,
            last_test_status: StatusCode::UNSET,
            ever_ran: false,
            fired_by: None,
            steps: 0,
        }
    }
}
