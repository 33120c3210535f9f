//! Device run state, lifecycle events and derived health.
//!
//! ```text
//!            BeginOpen            Opened
//!   Idle ─────────────▶ Opening ─────────▶ Testing ──Finished──▶ Completed{Good,Bad}
//!    ▲                     │ OpenFailed       │                        │
//!    │                     └──────────────────┼──────▶ CompletedBad    │
//!    └──── Disabled / Paused / ForceStop ─────┘                        │
//!    └──── Disabled / NewRun ──────────────────────────────────────────┘
//! ```
//!
//! `RetryRequested` moves any settled state to `Retrying`, which becomes
//! `Idle` on the following tick.

use diag_common::status::{Severity, StatusCode};
use serde::Serialize;
use std::fmt;

/// Device lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[repr(u8)]
pub enum RunState {
    #[default]
    Idle = 0,
    /// Only observable while `open_hardware` executes.
    Opening = 1,
    Testing = 2,
    CompletedGood = 3,
    CompletedBad = 4,
    /// Published for the tick in which a retry is consumed.
    Retrying = 5,
}

impl RunState {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Opening),
            2 => Some(Self::Testing),
            3 => Some(Self::CompletedGood),
            4 => Some(Self::CompletedBad),
            5 => Some(Self::Retrying),
            _ => None,
        }
    }

    /// Completion latch is set.
    #[inline]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::CompletedGood | Self::CompletedBad)
    }

    /// Dashboard `State` value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Opening => "OPENING",
            Self::Testing => "TESTING",
            Self::CompletedGood => "FINISHED_GOOD",
            Self::CompletedBad => "FINISHED_BAD",
            Self::Retrying => "RETRY",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that drive the device lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Enabled and selected, about to call `open_hardware`.
    BeginOpen,
    /// Open returned a non-terminal status.
    Opened,
    /// Open returned a terminal status.
    OpenFailed,
    /// Test finished by a terminator, a step error or a run abort.
    Finished { bad: bool },
    /// Enable went false.
    Disabled,
    /// Run gate closed while testing (run ended or device deselected).
    Paused,
    /// External force stop.
    ForceStop,
    /// Operator retry consumed.
    RetryRequested,
    /// Tick after a retry.
    RetryConsumed,
    /// A new run selected this device.
    NewRun,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed (or stayed, when the event is a no-op for it).
    Ok(RunState),
    /// Event is not valid in the current state.
    Rejected(&'static str),
}

/// Pure transition table.
pub fn transition(state: RunState, event: DeviceEvent) -> Transition {
    use DeviceEvent as E;
    use RunState as S;

    let next = match (state, event) {
        (S::Idle, E::BeginOpen) => S::Opening,
        (S::Opening, E::Opened) => S::Testing,
        (S::Opening, E::OpenFailed) => S::CompletedBad,

        (S::Testing, E::Finished { bad: false }) => S::CompletedGood,
        (S::Testing, E::Finished { bad: true }) => S::CompletedBad,
        // Abort of a selected device that has not opened yet
        (S::Idle, E::Finished { bad }) => {
            if bad {
                S::CompletedBad
            } else {
                S::CompletedGood
            }
        }

        (S::Idle | S::Testing | S::CompletedGood | S::CompletedBad, E::Disabled) => S::Idle,
        (S::Testing, E::Paused | E::ForceStop) => S::Idle,
        (S::Idle | S::CompletedGood | S::CompletedBad, E::ForceStop) => state,

        (S::Idle | S::Testing | S::CompletedGood | S::CompletedBad | S::Retrying, E::RetryRequested) => {
            S::Retrying
        }
        (S::Retrying, E::RetryConsumed) => S::Idle,

        (S::Idle | S::CompletedGood | S::CompletedBad, E::NewRun) => S::Idle,

        (S::Opening, _) => return Transition::Rejected("open in progress"),
        (S::Retrying, _) => return Transition::Rejected("retry not yet consumed"),
        (S::CompletedGood | S::CompletedBad, _) => return Transition::Rejected("completion latched"),
        (S::Idle, _) => return Transition::Rejected("not testing"),
        (S::Testing, _) => return Transition::Rejected("already testing"),
    };
    Transition::Ok(next)
}

/// Dashboard `Health` value derived from the last test status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Health {
    Unknown,
    Good,
    Warning,
    Error,
}

impl Health {
    pub const fn of(status: StatusCode) -> Self {
        if status.is_unset() {
            return Self::Unknown;
        }
        match status.severity() {
            Severity::Success | Severity::Info => Self::Good,
            Severity::Warning => Self::Warning,
            Severity::Error | Severity::Fatal => Self::Error,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Good => "GOOD",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
