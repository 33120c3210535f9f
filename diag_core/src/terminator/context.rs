//! Per-tick view handed to terminator evaluation.

use crate::ids::DeviceId;
use std::time::Duration;

/// Run state as seen by devices and terminators during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSnapshot {
    pub active: bool,
    pub run_id: u32,
    /// Scheduler timestamp of the current run's start.
    pub started_at: Option<Duration>,
}

/// Engine-wide data for one tick. Slices are indexed by [`DeviceId`].
#[derive(Debug, Clone, Copy)]
pub struct TickInfo<'a> {
    pub now: Duration,
    pub run: RunSnapshot,
    pub names: &'a [String],
    pub positions: &'a [Option<f64>],
}

/// A device bound to the terminator being evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundDevice<'a> {
    pub id: DeviceId,
    pub name: &'a str,
    /// Position in rotations, `None` if the device has no readout.
    pub position: Option<f64>,
}

/// What a terminator can see while evaluating.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    now: Duration,
    run: RunSnapshot,
    names: &'a [String],
    positions: &'a [Option<f64>],
    bound: &'a [DeviceId],
}

impl<'a> EvalContext<'a> {
    pub fn new(info: &TickInfo<'a>, bound: &'a [DeviceId]) -> Self {
        Self {
            now: info.now,
            run: info.run,
            names: info.names,
            positions: info.positions,
            bound,
        }
    }

    #[inline]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[inline]
    pub fn run_id(&self) -> u32 {
        self.run.run_id
    }

    /// Start timestamp of the active run.
    #[inline]
    pub fn run_start(&self) -> Option<Duration> {
        if self.run.active { self.run.started_at } else { None }
    }

    /// Devices bound to this terminator, in binding order.
    pub fn bound_devices(&self) -> impl Iterator<Item = BoundDevice<'a>> {
        let names = self.names;
        let positions = self.positions;
        self.bound.iter().map(move |&id| BoundDevice {
            id,
            name: names.get(id.index()).map_or("", String::as_str),
            position: positions.get(id.index()).copied().flatten(),
        })
    }

    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }
}
