//! Prelude module for common re-exports.
//!
//! ```rust
//! use diag_common::prelude::*;
//! ```

use std::time::Duration;

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};

// ─── Status Codes ───────────────────────────────────────────────────
pub use crate::status::{Facility, Severity, StatusCode, StatusRegistry, codes, message_of};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_KEY_ROOT, DEFAULT_TICK_PERIOD_MS};

/// Default scheduler period as Duration.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(DEFAULT_TICK_PERIOD_MS);
