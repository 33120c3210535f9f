//! Driver registry for bench devices.
//!
//! Provides a `DriverRegistry` struct mapping driver names to device
//! factories. Constructed at startup and passed to the bench by reference.

use diag_core::device::DeviceHooks;
use diag_core::terminators::DigitalStateTerminator;
use std::collections::HashMap;

use crate::config::DeviceConfig;
use crate::drivers::register_all_drivers;
use crate::error::BenchError;

/// What a factory builds for one `[[devices]]` entry.
pub enum DriverUnit {
    Device(Box<dyn DeviceHooks>),
    /// Registered as a device and as a terminator under the same name.
    DeviceTerminator(DigitalStateTerminator),
}

/// Factory function type for creating device instances.
pub type DriverFactory = fn(&DeviceConfig) -> DriverUnit;

/// Registry of available device drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Build the device described by `cfg` with its configured driver.
    ///
    /// # Errors
    /// Returns `BenchError::DriverNotFound` if the driver is not registered.
    pub fn create(&self, cfg: &DeviceConfig) -> Result<DriverUnit, BenchError> {
        let factory = self
            .get_factory(&cfg.driver)
            .ok_or_else(|| BenchError::DriverNotFound(cfg.driver.clone()))?;
        Ok(factory(cfg))
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
