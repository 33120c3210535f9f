//! Diagnostic Core Library
//!
//! Device lifecycle state machine, termination protocol and run
//! coordination for bring-up testing of individual hardware components.
//!
//! # Module Structure
//!
//! - [`device`] - Device hooks, run states and the per-device state machine
//! - [`terminator`] - Terminator trait, reference-counted slots, bindings
//! - [`terminators`] - Built-in timer, digital, position and delta terminators
//! - [`coordinator`] - Run start/stop and run ids
//! - [`engine`] - `DiagEngine`, the context object the scheduler ticks
//! - [`dashboard`] - Dashboard key-value contract and key layout
//! - [`error`] - Hook and engine error types
//!
//! # Usage
//!
//! ```rust
//! use diag_core::prelude::*;
//! use std::time::Duration;
//!
//! struct Fan;
//!
//! impl DeviceHooks for Fan {
//!     fn open_hardware(&mut self) -> StatusCode { codes::INIT_OK }
//!     fn close_hardware(&mut self) -> Result<(), HookError> { Ok(()) }
//!     fn run_test_step(&mut self) -> StatusCode { codes::TEST_OK }
//!     fn stop_hardware(&mut self) -> Result<(), HookError> { Ok(()) }
//! }
//!
//! let mut engine = DiagEngine::new(MemoryDashboard::new());
//! let fan = engine.add_device("Fan", Fan).unwrap();
//! let timer = engine
//!     .add_terminator(TimerTerminator::new("FanTimer", Duration::from_secs(2)))
//!     .unwrap();
//! engine.attach(fan, timer, true).unwrap();
//!
//! engine.periodic(Duration::ZERO); // seeds keys
//! engine.dashboard_mut().put_bool("Diag/Fan/Enable", true);
//! engine.dashboard_mut().put_bool("Diag/StartTest", true);
//! engine.periodic(Duration::from_millis(20));
//! assert_eq!(engine.device(fan).unwrap().state(), RunState::Testing);
//! ```

pub mod coordinator;
pub mod dashboard;
pub mod device;
pub mod engine;
pub mod error;
pub mod ids;
pub mod prelude;
mod shared;
pub mod terminator;
pub mod terminators;
