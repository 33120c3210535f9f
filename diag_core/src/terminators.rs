//! Built-in terminators.
//!
//! - [`timer`] - fires once a time budget has elapsed
//! - [`digital`] - fires on a digital input edge (limit switch); also a device
//! - [`position`] - fires when any bound device passes an absolute position
//! - [`delta`] - fires when any bound device moved a distance since run start
//!
//! Every kind has a configurable firing status.

pub mod delta;
pub mod digital;
pub mod position;
pub mod timer;

pub use delta::DeltaTerminator;
pub use digital::{DigitalInput, DigitalStateTerminator};
pub use position::PositionTerminator;
pub use timer::{TimerEpoch, TimerTerminator};

use diag_common::status::StatusCode;
use tracing::warn;

/// Firing status to keep after a `with_status` call. Sentinels would read as
/// "did not fire", so they leave `current` in place.
pub(crate) fn checked_fire_status(
    name: &str,
    current: StatusCode,
    requested: StatusCode,
) -> StatusCode {
    if requested.is_sentinel() {
        warn!("Terminator '{}' ignores reserved firing status {}", name, requested);
        current
    } else {
        requested
    }
}
