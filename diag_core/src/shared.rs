//! Adapters for a type that is both a device and a terminator.
//!
//! The engine owns device hooks and terminators as separate boxes. A union
//! type is placed behind one `Rc<RefCell<_>>` and each box holds a handle.
//! The engine is single-threaded and never calls both sides re-entrantly,
//! so a failed borrow only reports a fault.

use crate::device::DeviceHooks;
use crate::error::HookError;
use crate::terminator::{EvalContext, Terminator};
use diag_common::status::{StatusCode, codes};
use std::cell::RefCell;
use std::rc::Rc;

const BUSY: &str = "shared device/terminator already borrowed";

pub(crate) struct SharedDevice<T>(pub(crate) Rc<RefCell<T>>);

pub(crate) struct SharedTerminator<T> {
    pub(crate) name: String,
    pub(crate) inner: Rc<RefCell<T>>,
}

impl<T: DeviceHooks> DeviceHooks for SharedDevice<T> {
    fn open_hardware(&mut self) -> StatusCode {
        match self.0.try_borrow_mut() {
            Ok(mut inner) => inner.open_hardware(),
            Err(_) => codes::HW_FAULT,
        }
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        self.0
            .try_borrow_mut()
            .map_err(|_| HookError::fault(BUSY))?
            .close_hardware()
    }

    fn run_test_step(&mut self) -> StatusCode {
        match self.0.try_borrow_mut() {
            Ok(mut inner) => inner.run_test_step(),
            Err(_) => codes::HW_FAULT,
        }
    }

    fn stop_hardware(&mut self) -> Result<(), HookError> {
        self.0
            .try_borrow_mut()
            .map_err(|_| HookError::fault(BUSY))?
            .stop_hardware()
    }

    fn on_test_start(&mut self) {
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.on_test_start();
        }
    }

    fn on_test_end(&mut self) {
        if let Ok(mut inner) = self.0.try_borrow_mut() {
            inner.on_test_end();
        }
    }

    fn debug_extra(&self) -> String {
        self.0
            .try_borrow()
            .map(|inner| inner.debug_extra())
            .unwrap_or_default()
    }

    fn position_rotations(&self) -> Option<f64> {
        self.0.try_borrow().ok().and_then(|inner| inner.position_rotations())
    }
}

impl<T: Terminator> Terminator for SharedTerminator<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_hardware(&mut self) -> Result<(), HookError> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| HookError::fault(BUSY))?
            .open_hardware()
    }

    fn close_hardware(&mut self) -> Result<(), HookError> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| HookError::fault(BUSY))?
            .close_hardware()
    }

    fn evaluate(&mut self, ctx: &EvalContext<'_>) -> Result<StatusCode, HookError> {
        self.inner
            .try_borrow_mut()
            .map_err(|_| HookError::fault(BUSY))?
            .evaluate(ctx)
    }

    fn debug_text(&self) -> String {
        self.inner
            .try_borrow()
            .map(|inner| inner.debug_text())
            .unwrap_or_default()
    }
}
