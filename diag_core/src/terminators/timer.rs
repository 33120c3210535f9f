//! Time budget terminator.

use crate::error::HookError;
use crate::terminator::{EvalContext, Terminator};
use diag_common::status::{StatusCode, codes};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the elapsed time is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerEpoch {
    /// First evaluation after the hardware was opened.
    #[default]
    FirstEvaluation,
    /// Start of the current run, shared by every device in it.
    RunStart,
}

#[derive(Debug, Clone)]
pub struct TimerTerminator {
    name: String,
    duration: Duration,
    epoch: TimerEpoch,
    fire_status: StatusCode,
    baseline: Option<Duration>,
    elapsed: Duration,
}

impl TimerTerminator {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            epoch: TimerEpoch::FirstEvaluation,
            fire_status: codes::TERM_TERMINATED_OK,
            baseline: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_epoch(mut self, epoch: TimerEpoch) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.fire_status = super::checked_fire_status(&self.name, self.fire_status, status);
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn epoch(&self) -> TimerEpoch {
        self.epoch
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Terminator for TimerTerminator {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_hardware(&mut self) -> Result<(), HookError> {
        self.baseline = None;
        self.elapsed = Duration::ZERO;
        Ok(())
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<StatusCode, HookError> {
        let baseline = match (self.epoch, ctx.run_start()) {
            (TimerEpoch::RunStart, Some(start)) => start,
            _ => *self.baseline.get_or_insert(ctx.now()),
        };
        self.elapsed = ctx.now().saturating_sub(baseline);
        if self.elapsed >= self.duration {
            Ok(self.fire_status)
        } else {
            Ok(StatusCode::TERM_CONTINUE)
        }
    }

    fn debug_text(&self) -> String {
        format!(
            "elapsed={:.2}s limit={:.2}s",
            self.elapsed.as_secs_f64(),
            self.duration.as_secs_f64()
        )
    }
}
