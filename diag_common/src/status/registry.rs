//! Status message registry.
//!
//! Provides a `StatusRegistry` struct mapping packed status values to
//! human-readable text. Tests construct isolated instances; the process-wide
//! instance behind [`register`] / [`message_of`] is pre-seeded with the
//! built-in framework codes.

use super::code::{Facility, Severity, StatusCode, StatusError};
use super::codes::BUILTIN;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

/// Registry of known status values and their messages.
#[derive(Debug, Default)]
pub struct StatusRegistry {
    messages: HashMap<u32, String>,
    severities: HashMap<(Facility, u16), Severity>,
}

impl StatusRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with every built-in framework code.
    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        for &(status, message) in BUILTIN {
            reg.register_code(status, message);
        }
        reg
    }

    /// Register a status and its message.
    ///
    /// Registering the same `(facility, code, severity)` again is a no-op
    /// that returns the same value; the first message is kept.
    ///
    /// # Panics
    /// Panics if `(facility, code)` is already registered with a different
    /// severity. That is a programming error in the code tables.
    pub fn register(
        &mut self,
        severity: Severity,
        facility: Facility,
        code: u16,
        control: u8,
        message: impl Into<String>,
    ) -> StatusCode {
        self.register_code(StatusCode::pack(severity, facility, code, control), message)
    }

    /// Register an already packed status.
    ///
    /// # Panics
    /// Same contract as [`StatusRegistry::register`].
    pub fn register_code(&mut self, status: StatusCode, message: impl Into<String>) -> StatusCode {
        match self.try_register_code(status, message) {
            Ok(status) => status,
            Err(e) => panic!("status {e}"),
        }
    }

    /// Register a status read from configuration.
    ///
    /// # Errors
    /// Returns `StatusError::SeverityConflict` if `(facility, code)` is
    /// already registered with a different severity.
    pub fn try_register_code(
        &mut self,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Result<StatusCode, StatusError> {
        let key = (status.facility(), status.code());
        if let Some(registered) = self.registered_severity(key.0, key.1) {
            if registered != status.severity() {
                return Err(StatusError::SeverityConflict {
                    facility: key.0,
                    code: key.1,
                    registered,
                    requested: status.severity(),
                });
            }
            return Ok(status);
        }
        let message = message.into();
        debug!("Registered status {} ({:?}): {}", status, status.severity(), message);
        self.severities.insert(key, status.severity());
        self.messages.insert(status.raw(), message);
        Ok(status)
    }

    /// Severity `(facility, code)` was registered with, if any.
    pub fn registered_severity(&self, facility: Facility, code: u16) -> Option<Severity> {
        self.severities.get(&(facility, code)).copied()
    }

    /// Message for a status; synthesises one for unknown values.
    pub fn message_of(&self, status: StatusCode) -> String {
        match self.messages.get(&status.raw()) {
            Some(msg) => msg.clone(),
            None => fallback_message(status),
        }
    }

    pub fn is_registered(&self, status: StatusCode) -> bool {
        self.messages.contains_key(&status.raw())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn fallback_message(status: StatusCode) -> String {
    format!(
        "facility={} code={} sev={} (0x{:08X})",
        status.facility().id(),
        status.code(),
        status.severity() as u8,
        status.raw()
    )
}

// ─── Process-wide registry ──────────────────────────────────────────

static GLOBAL_REGISTRY: LazyLock<RwLock<StatusRegistry>> =
    LazyLock::new(|| RwLock::new(StatusRegistry::with_builtins()));

/// Register a status in the process-wide registry.
///
/// Called once per distinct code at startup, typically from a hardware
/// family's code table.
///
/// # Panics
/// See [`StatusRegistry::register`].
pub fn register(
    severity: Severity,
    facility: Facility,
    code: u16,
    control: u8,
    message: &str,
) -> StatusCode {
    GLOBAL_REGISTRY
        .write()
        .register(severity, facility, code, control, message)
}

/// Register an already packed status in the process-wide registry.
pub fn register_code(status: StatusCode, message: &str) -> StatusCode {
    GLOBAL_REGISTRY.write().register_code(status, message)
}

/// Fallible [`register_code`] on the process-wide registry.
///
/// # Errors
/// See [`StatusRegistry::try_register_code`].
pub fn try_register_code(status: StatusCode, message: &str) -> Result<StatusCode, StatusError> {
    GLOBAL_REGISTRY.write().try_register_code(status, message)
}

/// Message for a status from the process-wide registry. Never fails.
pub fn message_of(status: StatusCode) -> String {
    GLOBAL_REGISTRY.read().message_of(status)
}
