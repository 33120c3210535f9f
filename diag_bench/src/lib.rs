//! # Diagnostic Bench Library
//!
//! Bench harness that wires devices, terminators and bindings from a TOML
//! file into a [`DiagEngine`](diag_core::engine::DiagEngine) and drives it
//! at a fixed period.
//!
//! # Module Structure
//!
//! - [`config`] - `BenchConfig` and its validation
//! - [`core`] - `BenchCore` wiring and tick loop
//! - [`driver_registry`] - Device driver factory registration
//! - [`drivers`] - Driver implementations (simulation)
//! - [`error`] - `BenchError`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          diag_bench                          │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │ BenchConfig  │──►│  BenchCore   │◄──│ Driver Registry  │  │
//! │  │   (TOML)     │   │ (tick loop)  │   │ sim_motor/input  │  │
//! │  └──────────────┘   └──────┬───────┘   └──────────────────┘  │
//! │                            │ periodic(now)                   │
//! │                            ▼                                 │
//! │                   ┌────────────────┐                         │
//! │                   │   DiagEngine   │ (diag_core)             │
//! │                   └────────────────┘                         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod driver_registry;
pub mod drivers;
pub mod error;

pub use crate::config::BenchConfig;
pub use crate::core::BenchCore;
pub use crate::driver_registry::{DriverRegistry, DriverUnit};
pub use crate::error::BenchError;
