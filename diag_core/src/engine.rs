//! Diagnostic engine: the explicit context object owning every device,
//! terminator and the run coordinator.
//!
//! The scheduler calls [`DiagEngine::periodic`] once per period:
//!
//! 1. poll `StartTest` / `StopTest`
//! 2. tick every device in registration order, broadcasting any firing
//!    shared terminator to its other armed dependents in the same tick
//! 3. end the run when every selected device completed
//! 4. publish the global run keys

use crate::coordinator::{RunCoordinator, RunEvent};
use crate::dashboard::{Dashboard, DeviceKeys, KeySpace};
use crate::device::{Device, DeviceHooks, FiredBy};
use crate::error::EngineError;
use crate::ids::{DeviceId, TerminatorId};
use crate::shared::{SharedDevice, SharedTerminator};
use crate::terminator::{RunSnapshot, Terminator, TerminatorBinding, TerminatorSlot, TickInfo};
use diag_common::consts::DEFAULT_KEY_ROOT;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info};

pub struct DiagEngine<D: Dashboard> {
    dashboard: D,
    space: KeySpace,
    devices: Vec<Device>,
    terminators: Vec<TerminatorSlot>,
    coordinator: RunCoordinator,
    /// Device names indexed by id, for terminator contexts.
    names: Vec<String>,
    /// Position readouts indexed by id, refreshed before each device tick.
    positions: Vec<Option<f64>>,
    ticks: u64,
}

impl<D: Dashboard> DiagEngine<D> {
    pub fn new(dashboard: D) -> Self {
        Self::with_key_root(dashboard, DEFAULT_KEY_ROOT)
    }

    pub fn with_key_root(dashboard: D, root: &str) -> Self {
        let space = KeySpace::new(root);
        Self {
            dashboard,
            coordinator: RunCoordinator::new(&space),
            space,
            devices: Vec::new(),
            terminators: Vec::new(),
            names: Vec::new(),
            positions: Vec::new(),
            ticks: 0,
        }
    }

    // ─── Registration ───────────────────────────────────────────────

    /// Register a device. Its keys are seeded on the next tick.
    pub fn add_device(
        &mut self,
        name: &str,
        hooks: impl DeviceHooks + 'static,
    ) -> Result<DeviceId, EngineError> {
        self.add_device_boxed(name, Box::new(hooks))
    }

    pub fn add_device_boxed(
        &mut self,
        name: &str,
        hooks: Box<dyn DeviceHooks>,
    ) -> Result<DeviceId, EngineError> {
        validate_name(name)?;
        if self.device_id(name).is_some() {
            return Err(EngineError::DuplicateDevice(name.to_string()));
        }
        let id = DeviceId(self.devices.len());
        let keys = DeviceKeys::new(&self.space, name);
        self.devices.push(Device::new(id, name, keys, hooks));
        self.names.push(name.to_string());
        self.positions.push(None);
        info!("Registered device '{}' ({})", name, id);
        Ok(id)
    }

    /// Register a pure terminator under its own name.
    pub fn add_terminator(
        &mut self,
        terminator: impl Terminator + 'static,
    ) -> Result<TerminatorId, EngineError> {
        self.add_terminator_boxed(Box::new(terminator))
    }

    pub fn add_terminator_boxed(
        &mut self,
        terminator: Box<dyn Terminator>,
    ) -> Result<TerminatorId, EngineError> {
        let name = terminator.name().to_string();
        validate_name(&name)?;
        if self.terminator_id(&name).is_some() {
            return Err(EngineError::DuplicateTerminator(name));
        }
        let id = TerminatorId(self.terminators.len());
        self.terminators.push(TerminatorSlot::new(terminator));
        info!("Registered terminator '{}' ({})", name, id);
        Ok(id)
    }

    /// Register a type that is both a device and a terminator, under the
    /// terminator's name in both registries.
    pub fn add_device_terminator<T>(&mut self, unit: T) -> Result<(DeviceId, TerminatorId), EngineError>
    where
        T: DeviceHooks + Terminator + 'static,
    {
        let name = unit.name().to_string();
        validate_name(&name)?;
        if self.device_id(&name).is_some() {
            return Err(EngineError::DuplicateDevice(name));
        }
        if self.terminator_id(&name).is_some() {
            return Err(EngineError::DuplicateTerminator(name));
        }
        let shared = Rc::new(RefCell::new(unit));
        let terminator = SharedTerminator {
            name: name.clone(),
            inner: Rc::clone(&shared),
        };
        let device = self.add_device(&name, SharedDevice(shared))?;
        let terminator = self.add_terminator(terminator)?;
        Ok((device, terminator))
    }

    /// Bind a terminator to a device. `default_use` seeds the binding's
    /// `UseTerm_<name>` key.
    pub fn attach(
        &mut self,
        device: DeviceId,
        terminator: TerminatorId,
        default_use: bool,
    ) -> Result<(), EngineError> {
        let slot = self
            .terminators
            .get_mut(terminator.index())
            .ok_or(EngineError::UnknownTerminator(terminator.index()))?;
        let dev = self
            .devices
            .get_mut(device.index())
            .ok_or(EngineError::UnknownDevice(device.index()))?;
        if dev.is_bound_to(terminator) {
            return Err(EngineError::DuplicateBinding {
                device: dev.name().to_string(),
                terminator: slot.name().to_string(),
            });
        }
        let use_key = self.space.use_term(dev.name(), slot.name());
        dev.attach(TerminatorBinding::new(terminator, slot.name(), use_key, default_use));
        slot.bind(device);
        debug!(
            "Attached terminator '{}' to device '{}' (default use={})",
            slot.name(),
            dev.name(),
            default_use
        );
        Ok(())
    }

    // ─── Scheduler entry points ─────────────────────────────────────

    /// One scheduler period. `now` is a monotonic timestamp.
    pub fn periodic(&mut self, now: Duration) -> Option<RunEvent> {
        self.ticks += 1;
        let mut event = self.coordinator.poll_start_stop_requests(
            &mut self.dashboard,
            &mut self.devices,
            &mut self.terminators,
            now,
        );
        let run = self.coordinator.snapshot();

        for index in 0..self.devices.len() {
            for (slot, device) in self.positions.iter_mut().zip(&self.devices) {
                *slot = device.position_rotations();
            }
            let info = TickInfo {
                now,
                run,
                names: &self.names,
                positions: &self.positions,
            };
            let fired = self.devices[index].tick(&mut self.dashboard, &mut self.terminators, &info);
            if let Some(fired) = fired {
                self.broadcast(DeviceId(index), &fired, run);
            }
        }

        if let Some(done) = self
            .coordinator
            .auto_end_run_if_complete(&mut self.dashboard, &self.devices)
        {
            event = Some(done);
        }
        self.coordinator.publish(&mut self.dashboard);
        event
    }

    /// Stop every other armed, testing dependent of a firing terminator.
    /// At most once per arm session of the terminator.
    fn broadcast(&mut self, source: DeviceId, fired: &FiredBy, run: RunSnapshot) {
        let slot = &mut self.terminators[fired.terminator.index()];
        if !slot.take_broadcast() {
            return;
        }
        let bound = slot.bound().to_vec();
        for id in bound {
            if id == source {
                continue;
            }
            let device = &mut self.devices[id.index()];
            if !device.is_armed_against(fired.terminator) {
                continue;
            }
            if device.terminate_from(&mut self.terminators, fired) {
                device.publish(&mut self.dashboard, run);
                debug!(
                    "Broadcast from '{}' stopped '{}'",
                    fired.name,
                    device.name()
                );
            }
        }
    }

    /// External force stop (e.g. the machine is disabled). Every device
    /// disarms and closes its hardware; completion latches are kept.
    pub fn stop_all(&mut self) {
        self.coordinator.force_stop(&mut self.dashboard);
        let run = self.coordinator.snapshot();
        for device in &mut self.devices {
            device.force_stop(&mut self.terminators);
            device.publish(&mut self.dashboard, run);
        }
        info!("All devices stopped");
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn dashboard(&self) -> &D {
        &self.dashboard
    }

    pub fn dashboard_mut(&mut self) -> &mut D {
        &mut self.dashboard
    }

    pub fn key_space(&self) -> &KeySpace {
        &self.space
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.index())
    }

    pub fn device_id(&self, name: &str) -> Option<DeviceId> {
        self.devices.iter().find(|d| d.name() == name).map(Device::id)
    }

    pub fn terminators(&self) -> &[TerminatorSlot] {
        &self.terminators
    }

    pub fn terminator(&self, id: TerminatorId) -> Option<&TerminatorSlot> {
        self.terminators.get(id.index())
    }

    pub fn terminator_id(&self, name: &str) -> Option<TerminatorId> {
        self.terminators
            .iter()
            .position(|t| t.name() == name)
            .map(TerminatorId)
    }

    pub fn coordinator(&self) -> &RunCoordinator {
        &self.coordinator
    }

    pub fn run_active(&self) -> bool {
        self.coordinator.is_active()
    }

    pub fn run_id(&self) -> u32 {
        self.coordinator.run_id()
    }

    /// Number of `periodic` calls so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn validate_name(name: &str) -> Result<(), EngineError> {
    if name.is_empty() || name.contains('/') {
        return Err(EngineError::InvalidName(name.to_string()));
    }
    Ok(())
}
