//! Bench driver implementations.
//!
//! - [`simulation`] - simulated motor and digital input
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Write a [`DriverFactory`](crate::driver_registry::DriverFactory)
//! 3. Register it in [`register_all_drivers`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register every built-in driver and its status codes.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    simulation::register_status_codes();
    registry.register("sim_motor", simulation::create_motor);
    registry.register("sim_input", simulation::create_input);
}
