//! Built-in framework status codes.
//!
//! Generic codes live in [`Facility::GENERIC`], termination protocol codes in
//! [`Facility::TERMINATOR`]. Hardware families define their own facility and
//! register their codes at startup.

use super::code::{Facility, Severity, StatusCode};

const fn generic(code: u16, severity: Severity) -> StatusCode {
    StatusCode::pack(severity, Facility::GENERIC, code, 0)
}

const fn terminator(code: u16, severity: Severity) -> StatusCode {
    StatusCode::pack(severity, Facility::TERMINATOR, code, 0)
}

pub const INIT_OK: StatusCode = generic(1, Severity::Success);
pub const INIT_FAIL: StatusCode = generic(2, Severity::Error);
pub const HW_NOT_PRESENT: StatusCode = generic(3, Severity::Error);
pub const TEST_OK: StatusCode = generic(4, Severity::Success);
pub const HW_FAULT: StatusCode = generic(5, Severity::Error);
pub const RUN_ABORTED: StatusCode = generic(8, Severity::Warning);

pub const TERM_TERMINATED_OK: StatusCode = terminator(6, Severity::Success);
pub const TERM_TERMINATED_BAD: StatusCode = terminator(7, Severity::Error);
pub const TERM_FAULT: StatusCode = terminator(9, Severity::Error);
pub const TERM_ROTATION_REACHED: StatusCode = terminator(120, Severity::Success);
pub const TERM_POSITION_LIMIT: StatusCode = terminator(121, Severity::Warning);

/// Every built-in code with its message. Seeded into every
/// [`StatusRegistry::with_builtins`](super::StatusRegistry::with_builtins).
pub const BUILTIN: &[(StatusCode, &str)] = &[
    (StatusCode::UNSET, "test not run"),
    (StatusCode::TERM_CONTINUE, "terminator continue"),
    (INIT_OK, "init ok"),
    (INIT_FAIL, "init failed"),
    (HW_NOT_PRESENT, "hardware not present"),
    (TEST_OK, "test ok"),
    (HW_FAULT, "hardware fault"),
    (RUN_ABORTED, "run aborted by operator"),
    (TERM_TERMINATED_OK, "test terminated by terminator (ok)"),
    (TERM_TERMINATED_BAD, "test terminated by fault"),
    (TERM_FAULT, "terminator fault"),
    (TERM_ROTATION_REACHED, "rotation delta reached"),
    (TERM_POSITION_LIMIT, "position limit reached"),
];
