//! Error types for hooks and engine wiring.

use diag_common::status::{StatusCode, codes};
use thiserror::Error;

/// Failure reported by a hardware hook.
///
/// Carries the status the failure maps to; the caller decides whether the
/// status escalates the device or terminator outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail} ({status})")]
pub struct HookError {
    pub status: StatusCode,
    pub detail: String,
}

impl HookError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Generic hardware fault.
    pub fn fault(detail: impl Into<String>) -> Self {
        Self::new(codes::HW_FAULT, detail)
    }

    /// The hardware handle is not open.
    pub fn not_present(detail: impl Into<String>) -> Self {
        Self::new(codes::HW_NOT_PRESENT, detail)
    }
}

/// Error types for engine wiring operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A device with this name already exists.
    #[error("Duplicate device name: {0}")]
    DuplicateDevice(String),

    /// A terminator with this name already exists.
    #[error("Duplicate terminator name: {0}")]
    DuplicateTerminator(String),

    /// Names become dashboard key segments.
    #[error("Invalid name '{0}': must be non-empty and must not contain '/'")]
    InvalidName(String),

    /// No device with this id.
    #[error("Unknown device id: {0}")]
    UnknownDevice(usize),

    /// No terminator with this id.
    #[error("Unknown terminator id: {0}")]
    UnknownTerminator(usize),

    /// The terminator is already attached to the device.
    #[error("Terminator '{terminator}' is already attached to device '{device}'")]
    DuplicateBinding { device: String, terminator: String },
}
