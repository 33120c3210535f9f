//! Termination protocol.
//!
//! This module contains:
//! - [`Terminator`] - the capability a stop condition implements
//! - [`context`] - the per-tick view a terminator evaluates against
//! - [`slot`] - framework-owned wrapper with the arm reference count
//! - [`binding`] - a device's edge-triggered link to one terminator
//!
//! Implementations only decide *whether* to fire. Reference counting,
//! fault isolation and broadcast are handled by [`TerminatorSlot`] and the
//! engine, so a pure terminator carries none of the device machinery.

pub mod binding;
pub mod context;
pub mod slot;

pub use binding::TerminatorBinding;
pub use context::{BoundDevice, EvalContext, RunSnapshot, TickInfo};
pub use slot::TerminatorSlot;

use crate::error::HookError;
use diag_common::status::StatusCode;

/// A condition that can request early termination of a bound device's test.
///
/// # Lifecycle
///
/// | Call             | When                                          |
/// |------------------|-----------------------------------------------|
/// | `open_hardware`  | First arm (reference count 0 → 1)             |
/// | `evaluate`       | Once per tick per armed, polling device       |
/// | `close_hardware` | Last disarm (N → 0) or after a terminal fire  |
pub trait Terminator {
    /// Name used for `UseTerm_<name>` keys and log attribution.
    fn name(&self) -> &str;

    fn open_hardware(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Return [`StatusCode::TERM_CONTINUE`] to decline, any other status to
    /// fire. Never return [`StatusCode::UNSET`].
    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<StatusCode, HookError>;

    fn debug_text(&self) -> String {
        String::new()
    }
}
