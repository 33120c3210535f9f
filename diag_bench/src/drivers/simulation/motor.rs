//! Simulated motor with an integrated encoder.
//!
//! The self-test drives the configured duty and requires the encoder to
//! move at least `min_rotations` within `max_steps` steps. A motor that
//! fails the check keeps reporting an error until it is reopened.

use diag_core::device::DeviceHooks;
use diag_core::error::HookError;
use diag_common::status::StatusCode;
use tracing::{debug, trace};

use super::status::{MOTOR_CMD_ERROR, MOTOR_CMD_OK, MOTOR_OPEN_FATAL, MOTOR_OPEN_OK};
use crate::config::DeviceConfig;

/// Tunables of the simulated motor and its verification test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimMotorParams {
    pub duty: f64,
    /// Encoder rotations per step at full duty.
    pub rotations_per_step: f64,
    pub min_rotations: f64,
    pub min_steps: u32,
    pub max_steps: u32,
    pub stalled: bool,
    pub fail_open: bool,
}

impl Default for SimMotorParams {
    fn default() -> Self {
        Self {
            duty: 0.25,
            rotations_per_step: 0.5,
            min_rotations: 0.25,
            min_steps: 10,
            max_steps: 50,
            stalled: false,
            fail_open: false,
        }
    }
}

impl From<&DeviceConfig> for SimMotorParams {
    fn from(cfg: &DeviceConfig) -> Self {
        Self {
            duty: cfg.duty,
            rotations_per_step: cfg.rotations_per_step,
            min_rotations: cfg.min_rotations,
            min_steps: cfg.min_steps,
            max_steps: cfg.max_steps,
            stalled: cfg.stalled,
            fail_open: cfg.fail_open,
        }
    }
}

#[derive(Debug)]
pub struct SimMotor {
    params: SimMotorParams,
    open: bool,
    /// Encoder position in rotations. Reset when the motor is opened.
    position: f64,
    commanded: f64,
    test_active: bool,
    test_failed: bool,
    start_position: f64,
    max_delta: f64,
    steps: u32,
}

impl SimMotor {
    pub fn new(params: SimMotorParams) -> Self {
        Self {
            params,
            open: false,
            position: 0.0,
            commanded: 0.0,
            test_active: false,
            test_failed: false,
            start_position: 0.0,
            max_delta: 0.0,
            steps: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn commanded_duty(&self) -> f64 {
        self.commanded
    }

    fn reset_test(&mut self) {
        self.test_active = false;
        self.test_failed = false;
        self.start_position = self.position;
        self.max_delta = 0.0;
        self.steps = 0;
    }

    /// Advance the encoder by what the last command produced.
    fn integrate(&mut self) {
        if !self.params.stalled {
            self.position += self.commanded * self.params.rotations_per_step;
        }
    }
}

impl DeviceHooks for SimMotor {
    fn open_hardware(&mut self) -> StatusCode {
        self.open = false;
        self.commanded = 0.0;
        if self.params.fail_open {
            return MOTOR_OPEN_FATAL;
        }
        self.position = 0.0;
        self.reset_test();
        self.open = true;
        MOTOR_OPEN_OK
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        self.commanded = 0.0;
        self.open = false;
        self.reset_test();
        Ok(())
    }

    fn run_test_step(&mut self) -> StatusCode {
        if !self.open {
            self.test_failed = true;
            return MOTOR_CMD_ERROR;
        }
        if self.test_failed {
            self.commanded = 0.0;
            return MOTOR_CMD_ERROR;
        }
        if !self.test_active {
            self.start_position = self.position;
            self.max_delta = 0.0;
            self.steps = 0;
            self.test_active = true;
            self.commanded = self.params.duty;
            return MOTOR_CMD_OK;
        }

        self.integrate();
        self.commanded = self.params.duty;
        let delta = (self.position - self.start_position).abs();
        self.max_delta = self.max_delta.max(delta);
        self.steps += 1;
        trace!("sim motor step {} delta={:.3}", self.steps, delta);

        if self.steps < self.params.min_steps || self.max_delta >= self.params.min_rotations {
            return MOTOR_CMD_OK;
        }
        if self.steps >= self.params.max_steps {
            debug!(
                "sim motor moved {:.3} rot in {} steps, need {:.3}",
                self.max_delta, self.steps, self.params.min_rotations
            );
            self.test_failed = true;
            self.commanded = 0.0;
            return MOTOR_CMD_ERROR;
        }
        MOTOR_CMD_OK
    }

    /// Stops the motor. A latched failure survives until reopen.
    fn stop_hardware(&mut self) -> Result<(), HookError> {
        self.test_active = false;
        self.commanded = 0.0;
        Ok(())
    }

    fn debug_extra(&self) -> String {
        format!(
            "duty={:.2} pos={:.3} maxDelta={:.3} steps={}{}",
            self.commanded,
            self.position,
            self.max_delta,
            self.steps,
            if self.test_failed { " FAILED" } else { "" }
        )
    }

    fn position_rotations(&self) -> Option<f64> {
        self.open.then_some(self.position)
    }
}
