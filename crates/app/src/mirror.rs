//! Device mirror: the engine tying registry, diffing and dispatch together.
//!
//! Snapshots and updates flow in from the session collaborator; every
//! snapshot fires one `DevicesLoaded`, every update that changed at least
//! one field fires one `DeviceUpdated`. Outbound requests go through the
//! [`CommandSink`] port.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use homemirror_domain::change::Changes;
use homemirror_domain::command::Command;
use homemirror_domain::device::{Device, DeviceKind};
use homemirror_domain::error::MirrorError;
use homemirror_domain::event::MirrorEvent;
use homemirror_domain::id::DeviceId;

use crate::event_bus::{DispatchBus, DispatchReport, Subscription};
use crate::ports::{CommandSink, Subscriber};
use crate::registry::DeviceRegistry;

/// How a snapshot treats devices already in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotMode {
    /// Merge the snapshot; devices absent from it are kept.
    #[default]
    Merge,
    /// Clear the registry and rebuild it from the snapshot.
    Replace,
}

/// The synchronization and dispatch engine.
///
/// Owns the registry exclusively; subscribers only ever see clones.
pub struct DeviceMirror<S> {
    registry: DeviceRegistry,
    bus: DispatchBus,
    sink: S,
    mode: SnapshotMode,
}

impl<S: CommandSink> DeviceMirror<S> {
    /// Create an engine sending outbound commands through `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            bus: DispatchBus::new(),
            sink,
            mode: SnapshotMode::default(),
        }
    }

    /// Choose how snapshots treat previously known devices.
    #[must_use]
    pub fn with_snapshot_mode(mut self, mode: SnapshotMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach a subscriber for as long as the returned handle lives.
    #[must_use = "dropping the subscription detaches the subscriber immediately"]
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> Subscription {
        self.bus.subscribe(subscriber)
    }

    /// Apply an authoritative snapshot and fire `DevicesLoaded` once.
    ///
    /// Devices without an id are dropped with a warning. Returns the current
    /// device list as delivered to subscribers.
    #[tracing::instrument(skip(self, devices), fields(count = devices.len()))]
    pub fn apply_snapshot(&mut self, devices: Vec<Device>) -> Vec<Device> {
        let devices = devices
            .into_iter()
            .filter(|device| match device.validate() {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(name = %device.name, error = %err, "dropping snapshot entry");
                    false
                }
            })
            .collect();
        let current = self
            .registry
            .apply_snapshot(devices, self.mode == SnapshotMode::Replace);
        tracing::info!(
            devices = current.len(),
            rooms = self.registry.rooms().len(),
            "snapshot applied"
        );
        self.publish(&MirrorEvent::loaded(current.clone()));
        current
    }

    /// Apply a single-device update and fire `DeviceUpdated` if anything
    /// changed.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Validation`] when the device has no id; the
    /// registry is left untouched.
    #[tracing::instrument(skip(self, device), fields(device_id = %device.id))]
    pub fn apply_update(&mut self, device: Device) -> Result<Changes, MirrorError> {
        device.validate()?;
        let applied = self.registry.apply_update(device);
        if applied.changes.any() {
            tracing::debug!(changes = ?applied.changes, "device changed");
            self.publish(&MirrorEvent::updated(applied.device, applied.changes));
        } else {
            tracing::trace!("update carried no change");
        }
        Ok(applied.changes)
    }

    fn publish(&self, event: &MirrorEvent) {
        let report: DispatchReport = self.bus.dispatch(event);
        if !report.is_clean() {
            tracing::warn!(
                event = event.kind(),
                delivered = report.delivered,
                failed = report.failures.len(),
                "dispatch completed with subscriber faults"
            );
        }
    }

    /// Device by id.
    #[must_use]
    pub fn get_by_id(&self, id: &DeviceId) -> Option<Device> {
        self.registry.get_by_id(id).cloned()
    }

    /// Device by name, case-insensitively; the last-indexed device wins.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Device> {
        self.registry.get_by_name(name).cloned()
    }

    /// Every known device, in first-seen order.
    #[must_use]
    pub fn get_all_devices(&self) -> Vec<Device> {
        self.registry.all()
    }

    /// Devices in `room`, case-insensitively.
    #[must_use]
    pub fn devices_in_room(&self, room: &str) -> Vec<Device> {
        self.registry.devices_in_room(room)
    }

    /// Devices of `kind`.
    #[must_use]
    pub fn devices_of_kind(&self, kind: DeviceKind) -> Vec<Device> {
        self.registry.devices_of_kind(kind)
    }

    /// Distinct room labels.
    #[must_use]
    pub fn rooms(&self) -> Vec<String> {
        self.registry.rooms()
    }

    /// Number of devices currently on.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.registry.active_count()
    }

    /// Whether a snapshot has been applied yet.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.registry.is_loaded()
    }

    /// Request a toggle of `id`.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn request_toggle(&self, id: &DeviceId) -> Result<(), MirrorError> {
        self.request(Command::Toggle { id: id.clone() })
    }

    /// Request `id` to switch on.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn request_turn_on(&self, id: &DeviceId) -> Result<(), MirrorError> {
        self.request(Command::TurnOn { id: id.clone() })
    }

    /// Request `id` to switch off.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn request_turn_off(&self, id: &DeviceId) -> Result<(), MirrorError> {
        self.request(Command::TurnOff { id: id.clone() })
    }

    /// Request a new level for `id`.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn request_set_value(&self, id: &DeviceId, value: u32) -> Result<(), MirrorError> {
        self.request(Command::SetValue {
            id: id.clone(),
            value,
        })
    }

    /// Request a new color (or command token) for `id`.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn request_set_color(
        &self,
        id: &DeviceId,
        color: impl Into<String>,
    ) -> Result<(), MirrorError> {
        self.request(Command::SetColor {
            id: id.clone(),
            color: color.into(),
        })
    }

    /// Request a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn request_refresh_all(&self) -> Result<(), MirrorError> {
        self.request(Command::RefreshAll)
    }

    /// Request every known device to switch off. Returns how many requests
    /// were sent.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::NotLoaded`] before the first snapshot, or a
    /// transport error from the command sink.
    pub fn request_all_off(&self) -> Result<usize, MirrorError> {
        self.ensure_loaded()?;
        self.fan_out(self.registry.all(), |id| Command::TurnOff { id })
    }

    /// Request every device in `room` to switch on.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::NotLoaded`] before the first snapshot, or a
    /// transport error from the command sink.
    pub fn request_room_on(&self, room: &str) -> Result<usize, MirrorError> {
        self.ensure_loaded()?;
        self.fan_out(self.registry.devices_in_room(room), |id| Command::TurnOn { id })
    }

    /// Request every device in `room` to switch off.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::NotLoaded`] before the first snapshot, or a
    /// transport error from the command sink.
    pub fn request_room_off(&self, room: &str) -> Result<usize, MirrorError> {
        self.ensure_loaded()?;
        self.fan_out(self.registry.devices_in_room(room), |id| Command::TurnOff { id })
    }

    fn ensure_loaded(&self) -> Result<(), MirrorError> {
        if self.registry.is_loaded() {
            Ok(())
        } else {
            Err(MirrorError::NotLoaded)
        }
    }

    fn fan_out(
        &self,
        devices: Vec<Device>,
        command: impl Fn(DeviceId) -> Command,
    ) -> Result<usize, MirrorError> {
        let count = devices.len();
        for device in devices {
            self.request(command(device.id))?;
        }
        Ok(count)
    }

    fn request(&self, command: Command) -> Result<(), MirrorError> {
        tracing::debug!(%command, "sending command");
        self.sink.send(command)
    }
}

/// Thread-safe handle serialising every mirror operation behind one lock.
///
/// Snapshot and update calls, including their event fan-out, never
/// interleave. Subscribers run while the lock is held and must not call
/// back into the same handle.
pub struct SharedMirror<S> {
    inner: Arc<Mutex<DeviceMirror<S>>>,
}

impl<S> Clone for SharedMirror<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CommandSink> SharedMirror<S> {
    /// Wrap an engine for use from several threads or tasks.
    pub fn new(mirror: DeviceMirror<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(mirror)),
        }
    }

    /// See [`DeviceMirror::apply_snapshot`].
    pub fn apply_snapshot(&self, devices: Vec<Device>) -> Vec<Device> {
        self.lock().apply_snapshot(devices)
    }

    /// See [`DeviceMirror::apply_update`].
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Validation`] when the device has no id.
    pub fn apply_update(&self, device: Device) -> Result<Changes, MirrorError> {
        self.lock().apply_update(device)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut DeviceMirror<S>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, DeviceMirror<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
