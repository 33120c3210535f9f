//! Absolute position limit terminator.
//!
//! Has no per-run state: a mechanism already past the limit fires on the
//! first evaluation after the next arm.

use crate::error::HookError;
use crate::terminator::{EvalContext, Terminator};
use diag_common::status::{StatusCode, codes};

#[derive(Debug, Clone)]
pub struct PositionTerminator {
    name: String,
    /// Absolute limit in rotations.
    limit: f64,
    fire_status: StatusCode,
    hit: Option<(String, f64)>,
}

impl PositionTerminator {
    pub fn new(name: impl Into<String>, limit: f64) -> Self {
        Self {
            name: name.into(),
            limit: limit.abs(),
            fire_status: codes::TERM_POSITION_LIMIT,
            hit: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.fire_status = super::checked_fire_status(&self.name, self.fire_status, status);
        self
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }
}

impl Terminator for PositionTerminator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<StatusCode, HookError> {
        for device in ctx.bound_devices() {
            let Some(position) = device.position else {
                continue;
            };
            if position.abs() >= self.limit {
                self.hit = Some((device.name.to_string(), position));
                return Ok(self.fire_status);
            }
        }
        Ok(StatusCode::TERM_CONTINUE)
    }

    fn debug_text(&self) -> String {
        match &self.hit {
            Some((name, position)) => {
                format!("absPosLimit={:.2} hit={}@{:.2}", self.limit, name, position)
            }
            None => format!("absPosLimit={:.2}", self.limit),
        }
    }
}
