//! Packed 32-bit status code value type.
//!
//! Layout (LSB → MSB):
//!
//! | Bits  | Field    | Width | Meaning                               |
//! |-------|----------|-------|---------------------------------------|
//! | 0-2   | severity | 3     | `Success` … `Fatal`                   |
//! | 3-15  | code     | 13    | facility-local identifier             |
//! | 16-27 | facility | 12    | namespace (one id per hardware family)|
//! | 28-31 | control  | 4     | reserved, always 0 in current use     |

use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;
use std::fmt;
use thiserror::Error;

pub const SEVERITY_SHIFT: u32 = 0;
pub const CODE_SHIFT: u32 = 3;
pub const FACILITY_SHIFT: u32 = 16;
pub const CONTROL_SHIFT: u32 = 28;

pub const SEVERITY_MASK: u32 = 0b111;
pub const CODE_MASK: u32 = 0x1FFF;
pub const FACILITY_MASK: u32 = 0x0FFF;
pub const CONTROL_MASK: u32 = 0xF;

/// Ordered severity carried in every status code.
///
/// `Success < Info < Warning < Error < Fatal`. Anything at or above
/// `Error` is terminal for the current test.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Severity {
    #[default]
    Success = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Fatal = 4,
}

impl Severity {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::Info),
            2 => Some(Self::Warning),
            3 => Some(Self::Error),
            4 => Some(Self::Fatal),
            _ => None,
        }
    }

    /// Decode the 3-bit severity field. Values 5..=7 are never produced by
    /// [`StatusCode::pack`] and decode as `Fatal`.
    #[inline]
    const fn from_field(bits: u32) -> Self {
        match bits {
            0 => Self::Success,
            1 => Self::Info,
            2 => Self::Warning,
            3 => Self::Error,
            _ => Self::Fatal,
        }
    }

    /// `true` for `Error` and `Fatal`.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        self as u8 >= Self::Error as u8
    }

    /// Single-letter summary prefix used on the dashboard.
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Success | Self::Info => "G",
            Self::Warning => "W",
            Self::Error | Self::Fatal => "E",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status code namespace. Each hardware family owns one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facility(u16);

impl Facility {
    /// Framework-wide codes.
    pub const GENERIC: Self = Self(0);
    /// Termination protocol codes. Kept away from hardware family ids.
    pub const TERMINATOR: Self = Self(100);

    /// Create a facility id, masked to 12 bits.
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self(id & (FACILITY_MASK as u16))
    }

    #[inline]
    pub const fn id(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from validated status construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// A field does not fit its bit width.
    #[error("{field} value {value} does not fit in {bits} bits")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        bits: u32,
    },

    /// `(facility, code)` is already registered with another severity.
    #[error("facility={facility} code={code} already registered as {registered}, not {requested}")]
    SeverityConflict {
        facility: Facility,
        code: u16,
        registered: Severity,
        requested: Severity,
    },
}

/// Packed 32-bit status value. Immutable once constructed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct StatusCode(u32);

assert_eq_size!(StatusCode, u32);

impl StatusCode {
    /// Never evaluated / test not run.
    pub const UNSET: Self = Self::pack(Severity::Info, Facility::GENERIC, CODE_MASK as u16, 0);

    /// A terminator declines to fire. Distinct from `0` and from `UNSET`.
    pub const TERM_CONTINUE: Self = Self::pack(Severity::Success, Facility::TERMINATOR, 0, 0);

    /// Pack the four fields. Each field is masked to its width.
    pub const fn pack(severity: Severity, facility: Facility, code: u16, control: u8) -> Self {
        Self(
            (((control as u32) & CONTROL_MASK) << CONTROL_SHIFT)
                | (((facility.0 as u32) & FACILITY_MASK) << FACILITY_SHIFT)
                | (((code as u32) & CODE_MASK) << CODE_SHIFT)
                | (((severity as u32) & SEVERITY_MASK) << SEVERITY_SHIFT),
        )
    }

    /// Pack the fields, rejecting values that would be truncated.
    ///
    /// # Errors
    /// Returns `StatusError::FieldOutOfRange` naming the first offending field.
    pub fn try_pack(
        severity: Severity,
        facility: u16,
        code: u16,
        control: u8,
    ) -> Result<Self, StatusError> {
        check_field("facility", facility as u32, FACILITY_MASK, 12)?;
        check_field("code", code as u32, CODE_MASK, 13)?;
        check_field("control", control as u32, CONTROL_MASK, 4)?;
        Ok(Self::pack(severity, Facility(facility), code, control))
    }

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn severity(self) -> Severity {
        Severity::from_field((self.0 >> SEVERITY_SHIFT) & SEVERITY_MASK)
    }

    #[inline]
    pub const fn facility(self) -> Facility {
        Facility(((self.0 >> FACILITY_SHIFT) & FACILITY_MASK) as u16)
    }

    #[inline]
    pub const fn code(self) -> u16 {
        ((self.0 >> CODE_SHIFT) & CODE_MASK) as u16
    }

    #[inline]
    pub const fn control(self) -> u8 {
        ((self.0 >> CONTROL_SHIFT) & CONTROL_MASK) as u8
    }

    /// Severity at or above `Error`.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        self.severity().is_terminal()
    }

    #[inline]
    pub const fn is_unset(self) -> bool {
        self.0 == Self::UNSET.0
    }

    #[inline]
    pub const fn is_continue(self) -> bool {
        self.0 == Self::TERM_CONTINUE.0
    }

    /// `UNSET` or `TERM_CONTINUE`. Neither can serve as a result.
    #[inline]
    pub const fn is_sentinel(self) -> bool {
        self.is_unset() || self.is_continue()
    }

    /// `0x%08X` rendering used for `LastStatusHex`.
    pub fn hex(self) -> String {
        format!("0x{:08X}", self.0)
    }
}

fn check_field(field: &'static str, value: u32, mask: u32, bits: u32) -> Result<(), StatusError> {
    if value & !mask != 0 {
        return Err(StatusError::FieldOutOfRange { field, value, bits });
    }
    Ok(())
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StatusCode(0x{:08X} sev={} fac={} code={})",
            self.0,
            self.severity(),
            self.facility(),
            self.code()
        )
    }
}
