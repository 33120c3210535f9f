//! Framework-owned terminator wrapper.
//!
//! Holds everything an implementation must not manage itself: the arm
//! reference count, whether the hardware is open, the last evaluated status,
//! the broadcast latch and the reverse set of bound devices.

use super::Terminator;
use super::context::{EvalContext, TickInfo};
use crate::ids::DeviceId;
use diag_common::status::{StatusCode, codes};
use tracing::{debug, warn};

pub struct TerminatorSlot {
    name: String,
    inner: Box<dyn Terminator>,
    arm_count: u32,
    hw_open: bool,
    /// Status of a failed open, reported by the next evaluation.
    open_failure: Option<StatusCode>,
    last_status: StatusCode,
    /// Set once a broadcast went out in the current arm session.
    broadcast_sent: bool,
    bound: Vec<DeviceId>,
}

impl TerminatorSlot {
    pub fn new(inner: Box<dyn Terminator>) -> Self {
        Self {
            name: inner.name().to_string(),
            inner,
            arm_count: 0,
            hw_open: false,
            open_failure: None,
            last_status: StatusCode::UNSET,
            broadcast_sent: false,
            bound: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    pub fn is_open(&self) -> bool {
        self.hw_open
    }

    pub fn last_status(&self) -> StatusCode {
        self.last_status
    }

    /// Devices bound to this terminator, in attach order.
    pub fn bound(&self) -> &[DeviceId] {
        &self.bound
    }

    pub fn debug_text(&self) -> String {
        self.inner.debug_text()
    }

    pub(crate) fn bind(&mut self, device: DeviceId) {
        if !self.bound.contains(&device) {
            self.bound.push(device);
        }
    }

    /// Enter active use for one device.
    ///
    /// Opens the hardware when it is not open: on the first arm, or to
    /// re-initialise after a fault closed it.
    pub fn arm_for_test(&mut self) {
        self.arm_count = self.arm_count.saturating_add(1);
        self.broadcast_sent = false;
        if self.hw_open {
            debug!("Terminator '{}' armed (count={})", self.name, self.arm_count);
            return;
        }
        match self.inner.open_hardware() {
            Ok(()) => {
                self.hw_open = true;
                self.open_failure = None;
                debug!(
                    "Terminator '{}' opened and armed (count={})",
                    self.name, self.arm_count
                );
            }
            Err(e) => {
                warn!("Terminator '{}' failed to open: {}", self.name, e);
                self.open_failure = Some(firing_status(e.status));
            }
        }
    }

    /// Leave active use for one device. Closes the hardware on N → 0.
    pub fn disarm_for_test(&mut self) {
        if self.arm_count == 0 {
            warn!("Terminator '{}' disarmed while not armed", self.name);
            return;
        }
        self.arm_count -= 1;
        debug!("Terminator '{}' disarmed (count={})", self.name, self.arm_count);
        if self.arm_count == 0 {
            self.open_failure = None;
            self.close();
        }
    }

    /// Evaluate for one polling device.
    ///
    /// Returns [`StatusCode::TERM_CONTINUE`] or a firing status. Faults are
    /// firing statuses; a terminal status closes the hardware so the next
    /// arm re-initialises it.
    pub fn evaluate(&mut self, info: &TickInfo<'_>) -> StatusCode {
        let status = if self.hw_open {
            let ctx = EvalContext::new(info, &self.bound);
            match self.inner.evaluate(&ctx) {
                Ok(s) if s.is_unset() => {
                    warn!("Terminator '{}' returned UNSET, treating as fault", self.name);
                    codes::TERM_FAULT
                }
                Ok(s) => s,
                Err(e) => {
                    warn!("Terminator '{}' evaluation failed: {}", self.name, e);
                    firing_status(e.status)
                }
            }
        } else {
            // Never evaluate against hardware that failed to open or faulted
            self.open_failure.unwrap_or(codes::TERM_FAULT)
        };

        if status.is_terminal() && self.hw_open {
            warn!(
                "Terminator '{}' fired {}, closing its hardware",
                self.name, status
            );
            self.close();
        }
        self.last_status = status;
        status
    }

    /// Claim the broadcast for the current arm session.
    pub(crate) fn take_broadcast(&mut self) -> bool {
        if self.broadcast_sent {
            return false;
        }
        self.broadcast_sent = true;
        true
    }

    fn close(&mut self) {
        if !self.hw_open {
            return;
        }
        self.hw_open = false;
        if let Err(e) = self.inner.close_hardware() {
            warn!("Terminator '{}' failed to close: {}", self.name, e);
        }
    }
}

/// Error statuses fire as-is; anything milder becomes a fault.
fn firing_status(status: StatusCode) -> StatusCode {
    if status.is_terminal() {
        status
    } else {
        codes::TERM_FAULT
    }
}

impl std::fmt::Debug for TerminatorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminatorSlot")
            .field("name", &self.name)
            .field("arm_count", &self.arm_count)
            .field("hw_open", &self.hw_open)
            .field("last_status", &self.last_status)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}
