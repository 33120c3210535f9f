//! Simulated digital input channel.
//!
//! The raw level starts at `initial_level` on every open and can be
//! scripted to flip after a number of reads. A test-side handle lets
//! callers drive the level directly.

use diag_core::error::HookError;
use diag_core::terminators::DigitalInput;
use std::cell::Cell;
use std::rc::Rc;
use tracing::debug;

use super::status::{INPUT_INIT_FAIL, INPUT_READ_FAULT};
use crate::config::DeviceConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimInputParams {
    pub initial_level: bool,
    pub flip_after_reads: Option<u32>,
    pub fail_open: bool,
}

impl From<&DeviceConfig> for SimInputParams {
    fn from(cfg: &DeviceConfig) -> Self {
        Self {
            initial_level: cfg.initial_level,
            flip_after_reads: cfg.flip_after_reads,
            fail_open: cfg.fail_open,
        }
    }
}

/// External control over a [`SimInput`] level.
#[derive(Debug, Clone, Default)]
pub struct SimInputHandle(Rc<Cell<Option<bool>>>);

impl SimInputHandle {
    /// Force the raw level, overriding the script until cleared.
    pub fn force(&self, level: bool) {
        self.0.set(Some(level));
    }

    pub fn release(&self) {
        self.0.set(None);
    }
}

#[derive(Debug)]
pub struct SimInput {
    params: SimInputParams,
    open: bool,
    level: bool,
    reads: u32,
    forced: SimInputHandle,
}

impl SimInput {
    pub fn new(params: SimInputParams) -> Self {
        Self {
            params,
            open: false,
            level: params.initial_level,
            reads: 0,
            forced: SimInputHandle::default(),
        }
    }

    pub fn handle(&self) -> SimInputHandle {
        self.forced.clone()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl DigitalInput for SimInput {
    fn open(&mut self) -> Result<(), HookError> {
        if self.params.fail_open {
            return Err(HookError::new(INPUT_INIT_FAIL, "sim input refused to open"));
        }
        self.open = true;
        self.level = self.params.initial_level;
        self.reads = 0;
        Ok(())
    }

    fn read(&mut self) -> Result<bool, HookError> {
        if !self.open {
            return Err(HookError::new(INPUT_READ_FAULT, "sim input read while closed"));
        }
        self.reads += 1;
        if self.params.flip_after_reads == Some(self.reads) {
            self.level = !self.level;
            debug!("sim input flipped to {} after {} reads", self.level, self.reads);
        }
        Ok(self.forced.0.get().unwrap_or(self.level))
    }

    fn close(&mut self) -> Result<(), HookError> {
        self.open = false;
        Ok(())
    }
}
