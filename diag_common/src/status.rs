//! Status code model.
//!
//! This module contains:
//! - [`code`] - the packed 32-bit `StatusCode` value type, `Severity`, `Facility`
//! - [`codes`] - built-in framework codes
//! - [`registry`] - message registry (isolated instances and the process-wide one)
//!
//! "Fatal enough to abort" is always `severity_of(s) >= Severity::Error`.

pub mod code;
pub mod codes;
pub mod registry;

pub use code::{Facility, Severity, StatusCode, StatusError};
pub use registry::{StatusRegistry, message_of, register, register_code, try_register_code};

/// Pack a status from its fields.
#[inline]
pub const fn pack(severity: Severity, facility: Facility, code: u16, control: u8) -> StatusCode {
    StatusCode::pack(severity, facility, code, control)
}

#[inline]
pub const fn severity_of(status: StatusCode) -> Severity {
    status.severity()
}

#[inline]
pub const fn facility_of(status: StatusCode) -> Facility {
    status.facility()
}

#[inline]
pub const fn code_of(status: StatusCode) -> u16 {
    status.code()
}
