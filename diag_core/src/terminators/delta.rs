//! Displacement terminator.
//!
//! Snapshots each bound device's position the first time it is seen in a
//! run (keyed by run id) and fires once any device moved `delta` rotations
//! away from its snapshot.

use crate::error::HookError;
use crate::ids::DeviceId;
use crate::terminator::{EvalContext, Terminator};
use diag_common::status::{StatusCode, codes};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DeltaTerminator {
    name: String,
    delta: f64,
    fire_status: StatusCode,
    snapshot_run: Option<u32>,
    start_positions: HashMap<DeviceId, f64>,
    hit: Option<(String, f64)>,
}

impl DeltaTerminator {
    pub fn new(name: impl Into<String>, delta: f64) -> Self {
        Self {
            name: name.into(),
            delta: delta.abs(),
            fire_status: codes::TERM_ROTATION_REACHED,
            snapshot_run: None,
            start_positions: HashMap::new(),
            hit: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.fire_status = super::checked_fire_status(&self.name, self.fire_status, status);
        self
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Snapshot position of a device in the current run.
    pub fn start_position(&self, device: DeviceId) -> Option<f64> {
        self.start_positions.get(&device).copied()
    }
}

impl Terminator for DeltaTerminator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<StatusCode, HookError> {
        if self.snapshot_run != Some(ctx.run_id()) {
            self.snapshot_run = Some(ctx.run_id());
            self.start_positions.clear();
            self.hit = None;
        }
        for device in ctx.bound_devices() {
            let Some(position) = device.position else {
                continue;
            };
            let start = *self.start_positions.entry(device.id).or_insert(position);
            let moved = (position - start).abs();
            if moved >= self.delta {
                self.hit = Some((device.name.to_string(), moved));
                return Ok(self.fire_status);
            }
        }
        Ok(StatusCode::TERM_CONTINUE)
    }

    fn debug_text(&self) -> String {
        match &self.hit {
            Some((name, moved)) => {
                format!("delta={:.2} hit={} moved={:.2}", self.delta, name, moved)
            }
            None => format!(
                "delta={:.2} run={}",
                self.delta,
                self.snapshot_run.unwrap_or_default()
            ),
        }
    }
}
