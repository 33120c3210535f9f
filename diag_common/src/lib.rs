//! Diagnostic Common Library
//!
//! This crate provides the status code model, configuration loading
//! utilities and shared constants for all diagnostic bench crates.
//!
//! # Module Structure
//!
//! - [`status`] - Packed 32-bit status codes and the message registry
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Dashboard key names and default timing
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use diag_common::status::{codes, message_of, Severity};
//!
//! assert_eq!(codes::INIT_FAIL.severity(), Severity::Error);
//! assert_eq!(message_of(codes::INIT_FAIL), "init failed");
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
pub mod status;
