//! Bench core: engine wiring and the fixed-period tick loop.
//!
//! The `BenchCore` struct builds a [`DiagEngine`] from a [`BenchConfig`],
//! drives it at the configured period and reports the final dashboard.

use diag_common::config::ConfigError;
use diag_common::consts::keys;
use diag_common::status::try_register_code;
use diag_core::coordinator::RunEvent;
use diag_core::dashboard::{Dashboard, MemoryDashboard};
use diag_core::engine::DiagEngine;
use diag_core::terminator::Terminator;
use diag_core::terminators::{
    DeltaTerminator, DigitalStateTerminator, PositionTerminator, TimerTerminator,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{BenchConfig, TerminatorConfig, TerminatorKind};
use crate::driver_registry::{DriverRegistry, DriverUnit};
use crate::drivers::simulation::{SimInput, SimInputParams};
use crate::error::BenchError;

/// Loop timing statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickStats {
    pub tick_count: u64,
    /// Ticks that took longer than the period.
    pub overruns: u64,
    pub max_tick_us: u64,
    pub total_tick_us: u64,
}

/// Bench core owning the engine and the loop state.
pub struct BenchCore {
    engine: DiagEngine<MemoryDashboard>,
    period: Duration,
    /// `0` runs until the running flag drops.
    max_ticks: u64,
    exit_on_complete: bool,
    /// Engine clock handed to `periodic`.
    clock: Duration,
    running: Arc<AtomicBool>,
    stats: TickStats,
    /// Buttons pressed by the core, released after the next tick.
    held_buttons: Vec<String>,
    last_event: Option<RunEvent>,
}

impl BenchCore {
    /// Validate the configuration, build and wire every device and
    /// terminator, then run one seeding tick.
    ///
    /// # Errors
    /// Returns error if validation, driver lookup or wiring fails.
    pub fn new(config: &BenchConfig, registry: &DriverRegistry) -> Result<Self, BenchError> {
        config.validate()?;

        let mut engine =
            DiagEngine::with_key_root(MemoryDashboard::new(), &config.engine.key_root);

        for device in &config.devices {
            match registry.create(device)? {
                DriverUnit::Device(hooks) => {
                    engine.add_device_boxed(&device.name, hooks)?;
                }
                DriverUnit::DeviceTerminator(unit) => {
                    engine.add_device_terminator(unit)?;
                }
            }
            debug!("Device '{}' uses driver '{}'", device.name, device.driver);
        }

        for terminator in &config.terminators {
            engine.add_terminator_boxed(build_terminator(terminator)?)?;
        }

        for binding in &config.bindings {
            let device = engine
                .device_id(&binding.device)
                .ok_or_else(|| BenchError::UnknownDevice(binding.device.clone()))?;
            let terminator = engine.terminator_id(&binding.terminator).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "unknown terminator '{}'",
                    binding.terminator
                ))
            })?;
            engine.attach(device, terminator, binding.default_use)?;
        }

        info!(
            "Bench '{}' wired: {} device(s), {} terminator(s), {} binding(s), period={}ms",
            config.shared.service_name,
            engine.devices().len(),
            engine.terminators().len(),
            config.bindings.len(),
            config.engine.tick_period_ms
        );

        let mut core = Self {
            engine,
            period: config.engine.tick_period(),
            max_ticks: config.engine.max_ticks,
            exit_on_complete: config.engine.exit_on_complete,
            clock: Duration::ZERO,
            running: Arc::new(AtomicBool::new(false)),
            stats: TickStats::default(),
            held_buttons: Vec::new(),
            last_event: None,
        };
        // Seed every key so later overrides are not clobbered
        core.tick_at(Duration::ZERO);
        Ok(core)
    }

    pub fn set_max_ticks(&mut self, max_ticks: u64) {
        self.max_ticks = max_ticks;
    }

    pub fn set_exit_on_complete(&mut self, exit: bool) {
        self.exit_on_complete = exit;
    }

    /// Set a device's `Enable` key.
    ///
    /// # Errors
    /// Returns `BenchError::UnknownDevice` if no device has this name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), BenchError> {
        if self.engine.device_id(name).is_none() {
            return Err(BenchError::UnknownDevice(name.to_string()));
        }
        let key = self.engine.key_space().device(name, keys::ENABLE);
        self.engine.dashboard_mut().put_bool(&key, enabled);
        info!("Device '{}' enable={}", name, enabled);
        Ok(())
    }

    /// Press `StartTest` for one tick.
    pub fn press_start(&mut self) {
        self.press(keys::START_TEST);
    }

    /// Press `StopTest` for one tick.
    pub fn press_stop(&mut self) {
        self.press(keys::STOP_TEST);
    }

    fn press(&mut self, field: &str) {
        let key = self.engine.key_space().global(field);
        self.engine.dashboard_mut().put_bool(&key, true);
        self.held_buttons.push(key);
    }

    /// Advance the engine clock by one period and tick.
    pub fn step(&mut self) -> Option<RunEvent> {
        self.clock += self.period;
        self.tick_at(self.clock)
    }

    fn tick_at(&mut self, now: Duration) -> Option<RunEvent> {
        let tick_start = Instant::now();
        let event = self.engine.periodic(now);

        for key in self.held_buttons.drain(..) {
            self.engine.dashboard_mut().put_bool(&key, false);
        }
        if let Some(event) = event {
            self.report(event);
            self.last_event = Some(event);
        }

        let tick_us = u64::try_from(tick_start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.stats.tick_count += 1;
        self.stats.total_tick_us += tick_us;
        self.stats.max_tick_us = self.stats.max_tick_us.max(tick_us);
        event
    }

    fn report(&self, event: RunEvent) {
        match event {
            RunEvent::Started { run_id, selected } => {
                info!("Run {} started with {} device(s)", run_id, selected);
            }
            RunEvent::Aborted { run_id, aborted } => {
                info!("Run {} aborted, {} device(s) cut short", run_id, aborted);
            }
            RunEvent::Completed { run_id } => {
                info!("Run {} completed", run_id);
                for device in self.engine.devices() {
                    if device.is_selected_for(run_id) {
                        info!(
                            "  {} [{}] {}",
                            device.name(),
                            device.state().as_str(),
                            device.summary()
                        );
                    }
                }
            }
        }
    }

    fn should_exit(&self, event: Option<RunEvent>, ticks: u64) -> bool {
        if self.max_ticks > 0 && ticks >= self.max_ticks {
            return true;
        }
        self.exit_on_complete
            && matches!(
                event,
                Some(RunEvent::Completed { .. } | RunEvent::Aborted { .. })
            )
    }

    /// Run the loop in real time until the running flag drops, `max_ticks`
    /// is reached, or a run ends with `exit_on_complete` set.
    ///
    /// # Errors
    /// Currently infallible; kept fallible for hardware drivers.
    pub fn run(&mut self) -> Result<(), BenchError> {
        info!("Starting bench loop (period={}ms)...", self.period.as_millis());
        self.running.store(true, Ordering::SeqCst);

        let base = self.clock;
        let started = Instant::now();
        let mut ticks = 0u64;

        while self.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();
            self.clock = base + self.period + started.elapsed();
            let event = self.tick_at(self.clock);
            ticks += 1;

            let elapsed = tick_start.elapsed();
            if elapsed > self.period {
                self.stats.overruns += 1;
                if self.stats.overruns <= 10 || self.stats.overruns % 1000 == 0 {
                    warn!(
                        "Tick overrun #{}: {}us (period {}ms)",
                        self.stats.overruns,
                        elapsed.as_micros(),
                        self.period.as_millis()
                    );
                }
            }

            if self.should_exit(event, ticks) {
                break;
            }

            if elapsed < self.period {
                std::thread::sleep(self.period - elapsed);
            }

            if self.stats.tick_count % 500 == 0 {
                debug!(
                    "Bench loop: {} ticks, avg={}us, max={}us, overruns={}",
                    self.stats.tick_count,
                    self.stats.total_tick_us / self.stats.tick_count,
                    self.stats.max_tick_us,
                    self.stats.overruns
                );
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!(
            "Bench loop stopped after {} ticks (overruns: {})",
            ticks, self.stats.overruns
        );
        Ok(())
    }

    /// Run up to `limit` ticks on the virtual clock without sleeping.
    /// Honors `max_ticks` and `exit_on_complete`. Returns the ticks run.
    pub fn run_simulated(&mut self, limit: u64) -> u64 {
        let mut ticks = 0;
        while ticks < limit {
            let event = self.step();
            ticks += 1;
            if self.should_exit(event, ticks) {
                break;
            }
        }
        ticks
    }

    /// Force-stop every device and end any run.
    pub fn shutdown(&mut self) {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);
        self.engine.stop_all();
    }

    /// Final dashboard as pretty JSON.
    ///
    /// # Errors
    /// Returns `BenchError::Dump` if serialization fails.
    pub fn dashboard_json(&self) -> Result<String, BenchError> {
        Ok(serde_json::to_string_pretty(self.engine.dashboard())?)
    }

    /// Write the dashboard JSON to a file.
    ///
    /// # Errors
    /// Returns error if serialization or writing fails.
    pub fn dump(&self, path: &Path) -> Result<(), BenchError> {
        std::fs::write(path, self.dashboard_json()?)?;
        info!("Dashboard written to {}", path.display());
        Ok(())
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn engine(&self) -> &DiagEngine<MemoryDashboard> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DiagEngine<MemoryDashboard> {
        &mut self.engine
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn last_event(&self) -> Option<RunEvent> {
        self.last_event
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }
}

/// Build one configured terminator with its firing status.
fn build_terminator(cfg: &TerminatorConfig) -> Result<Box<dyn Terminator>, BenchError> {
    let status = cfg.firing_status()?;
    if let Some(status) = status {
        try_register_code(status, &format!("{} fired", cfg.name)).map_err(|e| {
            ConfigError::ValidationError(format!("terminator '{}': {}", cfg.name, e))
        })?;
    }
    let name = cfg.name.clone();

    let terminator: Box<dyn Terminator> = match &cfg.kind {
        TerminatorKind::Timer { seconds, epoch } => {
            let duration = Duration::try_from_secs_f64(*seconds).map_err(|e| {
                ConfigError::ValidationError(format!("terminator '{}': {}", cfg.name, e))
            })?;
            let mut timer = TimerTerminator::new(name, duration).with_epoch(*epoch);
            if let Some(status) = status {
                timer = timer.with_status(status);
            }
            Box::new(timer)
        }
        TerminatorKind::Digital {
            initial_level,
            flip_after_reads,
            active_low,
        } => {
            let input = SimInput::new(SimInputParams {
                initial_level: *initial_level,
                flip_after_reads: *flip_after_reads,
                fail_open: false,
            });
            let mut switch = DigitalStateTerminator::new(name, Box::new(input)).active_low(*active_low);
            if let Some(status) = status {
                switch = switch.with_status(status);
            }
            Box::new(switch)
        }
        TerminatorKind::Position { limit } => {
            let mut position = PositionTerminator::new(name, *limit);
            if let Some(status) = status {
                position = position.with_status(status);
            }
            Box::new(position)
        }
        TerminatorKind::Delta { rotations } => {
            let mut delta = DeltaTerminator::new(name, *rotations);
            if let Some(status) = status {
                delta = delta.with_status(status);
            }
            Box::new(delta)
        }
    };
    Ok(terminator)
}
