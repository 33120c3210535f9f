//! Prelude module for common re-exports.
//!
//! ```rust
//! use diag_core::prelude::*;
//! ```

// ─── Status Codes ───────────────────────────────────────────────────
pub use diag_common::status::{Facility, Severity, StatusCode, codes, message_of};

// ─── Engine ─────────────────────────────────────────────────────────
pub use crate::coordinator::RunEvent;
pub use crate::engine::DiagEngine;
pub use crate::error::{EngineError, HookError};
pub use crate::ids::{DeviceId, TerminatorId};

// ─── Devices ────────────────────────────────────────────────────────
pub use crate::device::{DeviceHooks, DeviceStatus, FiredBy, Health, RunState};

// ─── Terminators ────────────────────────────────────────────────────
pub use crate::terminator::{BoundDevice, EvalContext, Terminator};
pub use crate::terminators::{
    DeltaTerminator, DigitalInput, DigitalStateTerminator, PositionTerminator, TimerEpoch,
    TimerTerminator,
};

// ─── Dashboard ──────────────────────────────────────────────────────
pub use crate::dashboard::{DashValue, Dashboard, MemoryDashboard};
