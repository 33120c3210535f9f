//! Simulation drivers for running the bench without hardware.

mod input;
mod motor;
pub mod status;

pub use input::{SimInput, SimInputHandle, SimInputParams};
pub use motor::{SimMotor, SimMotorParams};
pub use status::register_status_codes;

use crate::config::DeviceConfig;
use crate::driver_registry::DriverUnit;
use diag_core::terminators::DigitalStateTerminator;

/// Factory for `sim_motor` devices.
pub fn create_motor(cfg: &DeviceConfig) -> DriverUnit {
    DriverUnit::Device(Box::new(SimMotor::new(SimMotorParams::from(cfg))))
}

/// Factory for `sim_input` devices: a limit switch whose self-test reads
/// the channel. With `as_terminator` it also terminates bound devices.
pub fn create_input(cfg: &DeviceConfig) -> DriverUnit {
    let input = SimInput::new(SimInputParams::from(cfg));
    let switch = DigitalStateTerminator::new(cfg.name.clone(), Box::new(input))
        .active_low(cfg.active_low);
    if cfg.as_terminator {
        DriverUnit::DeviceTerminator(switch)
    } else {
        DriverUnit::Device(Box::new(switch))
    }
}
