//! Digital input terminator (limit switch, beam break).
//!
//! Also a device: its self-test opens the channel and reads it each step.
//! Device and terminator sides share the one input handle; the channel is
//! opened when the first side opens and closed when the last side closes.

use crate::device::DeviceHooks;
use crate::error::HookError;
use crate::terminator::{EvalContext, Terminator};
use diag_common::status::{StatusCode, codes};

/// A sampled boolean hardware channel.
pub trait DigitalInput {
    fn open(&mut self) -> Result<(), HookError>;
    fn read(&mut self) -> Result<bool, HookError>;
    fn close(&mut self) -> Result<(), HookError>;
}

pub struct DigitalStateTerminator {
    name: String,
    input: Box<dyn DigitalInput>,
    /// Pressed when the raw level is low.
    active_low: bool,
    fire_status: StatusCode,
    device_open: bool,
    terminator_open: bool,
    raw: bool,
    was_pressed: bool,
}

impl DigitalStateTerminator {
    pub fn new(name: impl Into<String>, input: Box<dyn DigitalInput>) -> Self {
        Self {
            name: name.into(),
            input,
            active_low: false,
            fire_status: codes::TERM_TERMINATED_OK,
            device_open: false,
            terminator_open: false,
            raw: false,
            was_pressed: false,
        }
    }

    pub fn active_low(mut self, active_low: bool) -> Self {
        self.active_low = active_low;
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.fire_status = super::checked_fire_status(&self.name, self.fire_status, status);
        self
    }

    pub fn is_pressed(&self) -> bool {
        self.raw != self.active_low
    }

    fn acquire(&mut self) -> Result<(), HookError> {
        if !self.device_open && !self.terminator_open {
            self.input.open()?;
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), HookError> {
        if !self.device_open && !self.terminator_open {
            self.input.close()?;
        }
        Ok(())
    }

    fn sample(&mut self) -> Result<bool, HookError> {
        self.raw = self.input.read()?;
        Ok(self.is_pressed())
    }

    fn describe(&self) -> String {
        format!(
            "raw={} pressed={}",
            u8::from(self.raw),
            u8::from(self.is_pressed())
        )
    }
}

impl Terminator for DigitalStateTerminator {
    fn name(&self) -> &str {
        &self.name
    }

    /// A switch already pressed at arm time fires on the first evaluation.
    fn open_hardware(&mut self) -> Result<(), HookError> {
        if !self.terminator_open {
            self.acquire()?;
            self.terminator_open = true;
        }
        self.was_pressed = false;
        Ok(())
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        if !self.terminator_open {
            return Ok(());
        }
        self.terminator_open = false;
        self.release()
    }

    fn evaluate(&mut self, _ctx: &EvalContext<'_>) -> Result<StatusCode, HookError> {
        let pressed = self.sample()?;
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;
        if edge {
            Ok(self.fire_status)
        } else {
            Ok(StatusCode::TERM_CONTINUE)
        }
    }

    fn debug_text(&self) -> String {
        self.describe()
    }
}

impl DeviceHooks for DigitalStateTerminator {
    fn open_hardware(&mut self) -> StatusCode {
        if self.device_open {
            return codes::INIT_OK;
        }
        match self.acquire() {
            Ok(()) => {
                self.device_open = true;
                codes::INIT_OK
            }
            Err(e) if e.status.is_terminal() => e.status,
            Err(_) => codes::INIT_FAIL,
        }
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        if !self.device_open {
            return Ok(());
        }
        self.device_open = false;
        self.release()
    }

    fn run_test_step(&mut self) -> StatusCode {
        match self.sample() {
            Ok(_) => codes::TEST_OK,
            Err(e) if e.status.is_terminal() => e.status,
            Err(_) => codes::HW_FAULT,
        }
    }

    fn stop_hardware(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    fn debug_extra(&self) -> String {
        self.describe()
    }
}
