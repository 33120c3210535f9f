//! Status codes of the simulated hardware families.
//!
//! Each family owns a facility. Codes are registered with their messages
//! by [`register_status_codes`] before any device is built.

use diag_common::status::{Facility, Severity, StatusCode, register_code};

pub const SIM_MOTOR: Facility = Facility::new(1);
pub const SIM_INPUT: Facility = Facility::new(3);

const fn motor(code: u16, severity: Severity) -> StatusCode {
    StatusCode::pack(severity, SIM_MOTOR, code, 0)
}

const fn input(code: u16, severity: Severity) -> StatusCode {
    StatusCode::pack(severity, SIM_INPUT, code, 0)
}

pub const MOTOR_OPEN_OK: StatusCode = motor(1, Severity::Success);
pub const MOTOR_OPEN_FATAL: StatusCode = motor(2, Severity::Fatal);
pub const MOTOR_CMD_OK: StatusCode = motor(3, Severity::Success);
pub const MOTOR_CMD_ERROR: StatusCode = motor(4, Severity::Error);

pub const INPUT_INIT_FAIL: StatusCode = input(2, Severity::Error);
pub const INPUT_READ_FAULT: StatusCode = input(4, Severity::Error);

const TABLE: &[(StatusCode, &str)] = &[
    (MOTOR_OPEN_OK, "sim motor open ok"),
    (MOTOR_OPEN_FATAL, "sim motor open fatal"),
    (MOTOR_CMD_OK, "sim motor command ok"),
    (MOTOR_CMD_ERROR, "sim motor command error"),
    (INPUT_INIT_FAIL, "sim input init failed"),
    (INPUT_READ_FAULT, "sim input read fault"),
];

/// Register every simulated family code. Idempotent.
pub fn register_status_codes() {
    for &(status, message) in TABLE {
        register_code(status, message);
    }
}
