//! Bench wiring configuration.
//!
//! One TOML file describes the engine, the devices with their drivers, the
//! terminators and the bindings between them.
//!
//! ```toml
//! [shared]
//! service_name = "bench"
//!
//! [engine]
//! tick_period_ms = 20
//!
//! [[devices]]
//! name = "ShooterMotor"
//! driver = "sim_motor"
//! duty = 0.25
//!
//! [[terminators]]
//! name = "ShootTimer2s"
//! kind = "timer"
//! seconds = 2.0
//!
//! [[bindings]]
//! device = "ShooterMotor"
//! terminator = "ShootTimer2s"
//! default_use = false
//! ```

use diag_common::config::{ConfigError, SharedConfig};
use diag_common::consts::{DEFAULT_KEY_ROOT, DEFAULT_TICK_PERIOD_MS};
use diag_common::status::{Facility, Severity, StatusCode, codes};
use diag_core::terminators::TimerEpoch;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::error::BenchError;

/// Root of the bench configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    pub shared: SharedConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub devices: Vec<DeviceConfig>,

    #[serde(default)]
    pub terminators: Vec<TerminatorConfig>,

    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

/// `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Dashboard key root.
    #[serde(default = "default_key_root")]
    pub key_root: String,

    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,

    /// Stop the loop after this many ticks. `0` runs until Ctrl-C.
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop the loop once a run completes.
    #[serde(default)]
    pub exit_on_complete: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_root: default_key_root(),
            tick_period_ms: default_tick_period_ms(),
            max_ticks: 0,
            exit_on_complete: false,
        }
    }
}

impl EngineConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

fn default_key_root() -> String {
    DEFAULT_KEY_ROOT.to_string()
}

fn default_tick_period_ms() -> u64 {
    DEFAULT_TICK_PERIOD_MS
}

/// One `[[devices]]` entry. Driver parameters a driver does not use are
/// ignored by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    pub name: String,
    pub driver: String,

    // ─── sim_motor ──────────────────────────────────────────────────
    /// Commanded duty while testing, `-1.0..=1.0`.
    #[serde(default = "default_duty")]
    pub duty: f64,

    /// Encoder rotations per step at full duty.
    #[serde(default = "default_rotations_per_step")]
    pub rotations_per_step: f64,

    /// Rotation the test must observe before it may pass.
    #[serde(default = "default_min_rotations")]
    pub min_rotations: f64,

    /// Steps before the movement check is judged.
    #[serde(default = "default_min_steps")]
    pub min_steps: u32,

    /// Steps after which too little movement latches a failure.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Simulate a seized motor: commands succeed, the encoder never moves.
    #[serde(default)]
    pub stalled: bool,

    // ─── sim_input ──────────────────────────────────────────────────
    /// Raw level right after open.
    #[serde(default)]
    pub initial_level: bool,

    /// Flip the raw level after this many reads of one open session.
    #[serde(default)]
    pub flip_after_reads: Option<u32>,

    /// Pressed when the raw level is low.
    #[serde(default)]
    pub active_low: bool,

    /// Also register the input as a terminator under the device name.
    #[serde(default)]
    pub as_terminator: bool,

    // ─── common ─────────────────────────────────────────────────────
    /// Fail every open attempt.
    #[serde(default)]
    pub fail_open: bool,
}

fn default_duty() -> f64 {
    0.25
}

fn default_rotations_per_step() -> f64 {
    0.5
}

fn default_min_rotations() -> f64 {
    0.25
}

fn default_min_steps() -> u32 {
    10
}

fn default_max_steps() -> u32 {
    50
}

/// One `[[terminators]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminatorConfig {
    pub name: String,

    #[serde(flatten)]
    pub kind: TerminatorKind,

    /// Severity of the firing status. Needs `code`.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Terminator-facility code of the firing status. Needs `severity`.
    #[serde(default)]
    pub code: Option<u16>,
}

/// Terminator kind and its parameters, selected by `kind = "..."`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminatorKind {
    Timer {
        seconds: f64,
        #[serde(default)]
        epoch: TimerEpoch,
    },
    Digital {
        #[serde(default)]
        initial_level: bool,
        #[serde(default)]
        flip_after_reads: Option<u32>,
        #[serde(default)]
        active_low: bool,
    },
    Position {
        limit: f64,
    },
    Delta {
        rotations: f64,
    },
}

impl TerminatorConfig {
    /// Configured firing status, or `None` to keep the kind's default.
    ///
    /// # Errors
    /// Returns `BenchError::FiringStatus` when the code does not fit.
    pub fn firing_status(&self) -> Result<Option<StatusCode>, BenchError> {
        match (self.severity, self.code) {
            (Some(severity), Some(code)) => {
                StatusCode::try_pack(severity, Facility::TERMINATOR.id(), code, 0)
                    .map(Some)
                    .map_err(|source| BenchError::FiringStatus {
                        name: self.name.clone(),
                        source,
                    })
            }
            _ => Ok(None),
        }
    }
}

/// One `[[bindings]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    pub device: String,
    pub terminator: String,

    /// Initial `UseTerm_<terminator>` value.
    #[serde(default = "default_use")]
    pub default_use: bool,
}

fn default_use() -> bool {
    true
}

impl BenchConfig {
    /// Reject configurations that could not be wired.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.engine.tick_period_ms == 0 {
            return Err(invalid("engine.tick_period_ms must be > 0"));
        }
        if self.engine.key_root.trim_matches('/').is_empty() {
            return Err(invalid("engine.key_root cannot be empty"));
        }

        let mut devices = HashSet::new();
        let mut terminators = HashSet::new();
        for device in &self.devices {
            check_name("device", &device.name)?;
            if !devices.insert(device.name.as_str()) {
                return Err(invalid(format!("duplicate device '{}'", device.name)));
            }
            if !(-1.0..=1.0).contains(&device.duty) {
                return Err(invalid(format!(
                    "device '{}': duty {} outside -1.0..=1.0",
                    device.name, device.duty
                )));
            }
            if !positive(device.min_rotations) || device.max_steps == 0 {
                return Err(invalid(format!(
                    "device '{}': min_rotations and max_steps must be > 0",
                    device.name
                )));
            }
            if device.as_terminator {
                terminators.insert(device.name.as_str());
            }
        }

        let mut firing: HashMap<u16, Severity> = codes::BUILTIN
            .iter()
            .filter(|(status, _)| status.facility() == Facility::TERMINATOR)
            .map(|(status, _)| (status.code(), status.severity()))
            .collect();

        for term in &self.terminators {
            check_name("terminator", &term.name)?;
            if !terminators.insert(term.name.as_str()) {
                return Err(invalid(format!("duplicate terminator '{}'", term.name)));
            }
            match &term.kind {
                TerminatorKind::Timer { seconds, .. } if !positive(*seconds) => {
                    return Err(invalid(format!("terminator '{}': seconds must be > 0", term.name)));
                }
                TerminatorKind::Position { limit } if !positive(*limit) => {
                    return Err(invalid(format!("terminator '{}': limit must be > 0", term.name)));
                }
                TerminatorKind::Delta { rotations } if !positive(*rotations) => {
                    return Err(invalid(format!(
                        "terminator '{}': rotations must be > 0",
                        term.name
                    )));
                }
                _ => {}
            }
            match (term.severity, term.code) {
                (None, None) => {}
                (Some(severity), Some(code)) => {
                    match term.firing_status() {
                        Err(_) => {
                            return Err(invalid(format!(
                                "terminator '{}': code {} does not fit 13 bits",
                                term.name, code
                            )));
                        }
                        Ok(Some(status)) if status.is_sentinel() => {
                            return Err(invalid(format!(
                                "terminator '{}': {} is reserved and cannot fire",
                                term.name, status
                            )));
                        }
                        Ok(_) => {}
                    }
                    // The status registry refuses one code with two severities
                    match firing.insert(code, severity) {
                        Some(existing) if existing != severity => {
                            return Err(invalid(format!(
                                "terminator '{}': code {} already used with severity {}",
                                term.name, code, existing
                            )));
                        }
                        _ => {}
                    }
                }
                _ => {
                    return Err(invalid(format!(
                        "terminator '{}': severity and code must be given together",
                        term.name
                    )));
                }
            }
        }

        let mut bound = HashSet::new();
        for binding in &self.bindings {
            if !devices.contains(binding.device.as_str()) {
                return Err(invalid(format!(
                    "binding references unknown device '{}'",
                    binding.device
                )));
            }
            if !terminators.contains(binding.terminator.as_str()) {
                return Err(invalid(format!(
                    "binding references unknown terminator '{}'",
                    binding.terminator
                )));
            }
            if !bound.insert((binding.device.as_str(), binding.terminator.as_str())) {
                return Err(invalid(format!(
                    "duplicate binding '{}' -> '{}'",
                    binding.device, binding.terminator
                )));
            }
        }

        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn check_name(what: &str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() || name.contains('/') {
        return Err(invalid(format!("invalid {what} name '{name}'")));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}
