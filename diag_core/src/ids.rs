//! Handles returned by engine registration.

use serde::Serialize;
use std::fmt;

/// Index of a device in its engine, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(pub(crate) usize);

/// Index of a terminator in its engine, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TerminatorId(pub(crate) usize);

impl DeviceId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl TerminatorId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev#{}", self.0)
    }
}

impl fmt::Display for TerminatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term#{}", self.0)
    }
}
