//! Hardware hook contract for a device under test.

use crate::error::HookError;
use diag_common::status::StatusCode;

/// Hardware hooks a device family implements.
///
/// # Lifecycle
///
/// | Hook             | When                                                  |
/// |------------------|-------------------------------------------------------|
/// | `open_hardware`  | Once per Idle → Testing transition                    |
/// | `on_test_start`  | After a successful open                               |
/// | `run_test_step`  | Once per tick while testing and no terminator fired   |
/// | `stop_hardware`  | On every teardown (fire, step error, disable, retry)  |
/// | `on_test_end`    | After `stop_hardware` when a test was running         |
/// | `close_hardware` | Exactly once after every open, before the next open   |
///
/// No hook may block: each call must return within one scheduler period.
/// Failures are reported as values; a status at or above `Error` is
/// terminal for the current test.
pub trait DeviceHooks {
    /// Acquire the hardware. A terminal status prevents the test from
    /// starting; `close_hardware` is still called afterwards.
    fn open_hardware(&mut self) -> StatusCode;

    /// Release the hardware.
    fn close_hardware(&mut self) -> Result<(), HookError>;

    /// Run one non-blocking test step.
    fn run_test_step(&mut self) -> StatusCode;

    /// Bring the hardware to a safe stop.
    fn stop_hardware(&mut self) -> Result<(), HookError>;

    fn on_test_start(&mut self) {}

    fn on_test_end(&mut self) {}

    /// Extra text appended to `DebugState`.
    fn debug_extra(&self) -> String {
        String::new()
    }

    /// Position readout in rotations, when the device has one.
    fn position_rotations(&self) -> Option<f64> {
        None
    }
}
