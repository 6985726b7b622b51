//! Per-room aggregator: keeps the device list and lighting of each room for
//! the 3D view.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use homemirror_domain::color::Rgb;
use homemirror_domain::device::{Device, DeviceKind, name_key};
use homemirror_domain::error::SubscriberError;
use homemirror_domain::event::MirrorEvent;
use homemirror_domain::id::DeviceId;

use crate::ports::Subscriber;

/// Aggregate lighting of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomLighting {
    /// At least one light in the room is on.
    pub lit: bool,
    /// Color of the first lit light, white when it has no parsable color.
    pub color: Rgb,
}

impl Default for RoomLighting {
    fn default() -> Self {
        Self {
            lit: false,
            color: Rgb::WHITE,
        }
    }
}

impl RoomLighting {
    fn compute(devices: &[Device]) -> Self {
        devices
            .iter()
            .find(|d| d.kind == DeviceKind::Light && d.status)
            .map_or_else(Self::default, |light| Self {
                lit: true,
                color: Rgb::parse_hex(&light.color).unwrap_or(Rgb::WHITE),
            })
    }
}

/// A room and the devices assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub name: String,
    pub devices: Vec<Device>,
    pub lighting: RoomLighting,
}

impl Room {
    fn new(name: String) -> Self {
        Self {
            name,
            devices: Vec::new(),
            lighting: RoomLighting::default(),
        }
    }

    fn upsert(&mut self, device: &Device) {
        match self.devices.iter_mut().find(|d| d.id == device.id) {
            Some(slot) => slot.clone_from(device),
            None => self.devices.push(device.clone()),
        }
        self.lighting = RoomLighting::compute(&self.devices);
    }

    fn remove(&mut self, id: &DeviceId) {
        self.devices.retain(|d| &d.id != id);
        self.lighting = RoomLighting::compute(&self.devices);
    }
}

#[derive(Debug, Default)]
struct State {
    rooms: Vec<Room>,
    by_key: HashMap<String, usize>,
    /// Room each device currently sits in.
    by_device: HashMap<DeviceId, usize>,
}

/// Subscriber that groups devices by room label.
///
/// Rooms are created when devices load, from every distinct non-empty room
/// label. A device whose room changes leaves its previous room; if the
/// new label was not known at load time, it joins no room.
#[derive(Debug, Default)]
pub struct RoomAggregator {
    state: Mutex<State>,
}

impl RoomAggregator {
    /// Create an aggregator with no rooms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All rooms, in creation order.
    #[must_use]
    pub fn rooms(&self) -> Vec<Room> {
        self.lock().rooms.clone()
    }

    /// A room by name, case-insensitively.
    #[must_use]
    pub fn room(&self, name: &str) -> Option<Room> {
        let state = self.lock();
        state
            .by_key
            .get(&name_key(name))
            .map(|&idx| state.rooms[idx].clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn on_loaded(&self, devices: &[Device]) {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.rooms.clear();
        state.by_key.clear();
        state.by_device.clear();
        for device in devices {
            if device.room.trim().is_empty() {
                continue;
            }
            let key = name_key(&device.room);
            let idx = match state.by_key.get(&key) {
                Some(&idx) => idx,
                None => {
                    let idx = state.rooms.len();
                    state.rooms.push(Room::new(device.room.clone()));
                    state.by_key.insert(key, idx);
                    idx
                }
            };
            state.rooms[idx].upsert(device);
            state.by_device.insert(device.id.clone(), idx);
        }
        tracing::debug!(rooms = state.rooms.len(), "rooms rebuilt");
    }

    fn on_updated(&self, device: &Device) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let target = state.by_key.get(&name_key(&device.room)).copied();
        if let Some(previous) = state.by_device.get(&device.id).copied()
            && Some(previous) != target
        {
            state.rooms[previous].remove(&device.id);
            state.by_device.remove(&device.id);
        }
        let Some(idx) = target else {
            tracing::debug!(device_id = %device.id, room = %device.room, "update for unknown room");
            return;
        };
        state.rooms[idx].upsert(device);
        state.by_device.insert(device.id.clone(), idx);
    }
}

impl Subscriber for RoomAggregator {
    fn name(&self) -> &str {
        "room_aggregator"
    }

    fn on_event(&self, event: &MirrorEvent) -> Result<(), SubscriberError> {
        match event {
            MirrorEvent::DevicesLoaded { devices, .. } => self.on_loaded(devices),
            MirrorEvent::DeviceUpdated { device, .. } => self.on_updated(device),
        }
        Ok(())
    }
}
