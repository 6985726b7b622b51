//! Device registry: the single source of truth for last-known device state.
//!
//! Holds one record per id plus a case-insensitive name index. Records are
//! created on first sight, replaced in place on every update, and never
//! expire.

use std::collections::HashMap;

use homemirror_domain::change::{Changes, merge};
use homemirror_domain::device::{Device, DeviceKind, name_key};
use homemirror_domain::id::DeviceId;

/// Outcome of applying a single update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The record as stored after the update.
    pub device: Device,
    /// Which fields changed compared with the previous record.
    pub changes: Changes,
}

/// In-memory registry of devices keyed by id, with a name index.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<DeviceId, Device>,
    /// First-seen order, so listings are stable.
    order: Vec<DeviceId>,
    /// Lowercased name → id. Last write wins on collision.
    names: HashMap<String, DeviceId>,
    loaded: bool,
}

impl DeviceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a full snapshot and return the authoritative device list.
    ///
    /// With `replace` set, the registry is cleared first and the returned
    /// list is the snapshot itself (deduplicated by id, later entries win).
    /// Otherwise the snapshot is merged and every known device is returned.
    /// In both cases an empty incoming color keeps a known color.
    pub fn apply_snapshot(&mut self, devices: Vec<Device>, replace: bool) -> Vec<Device> {
        let previous = if replace {
            self.order.clear();
            self.names.clear();
            std::mem::take(&mut self.devices)
        } else {
            HashMap::new()
        };

        for device in devices {
            let prior = self.devices.get(&device.id).or_else(|| previous.get(&device.id));
            let stored = merge(prior, device);
            self.store(stored);
        }
        self.loaded = true;
        self.all()
    }

    /// Apply a single-device update.
    ///
    /// Unknown ids are inserted with every flag set. Known ids are diffed
    /// against their stored record and replaced in place.
    pub fn apply_update(&mut self, incoming: Device) -> Applied {
        let previous = self.devices.get(&incoming.id);
        let changes = Changes::between(previous, &incoming);
        let stored = merge(previous, incoming);
        self.store(stored.clone());
        Applied {
            device: stored,
            changes,
        }
    }

    fn store(&mut self, device: Device) {
        let id = device.id.clone();
        let key = device.name_key();
        match self.devices.insert(id.clone(), device) {
            Some(old) => {
                let old_key = old.name_key();
                if old_key != key && self.names.get(&old_key) == Some(&id) {
                    self.hand_over_name(&old_key);
                }
            }
            None => self.order.push(id.clone()),
        }
        self.names.insert(key, id);
    }

    /// Point `key` at the latest device still carrying that name, or drop it.
    fn hand_over_name(&mut self, key: &str) {
        let heir = self
            .order
            .iter()
            .rev()
            .find(|id| self.devices.get(*id).is_some_and(|d| d.name_key() == key))
            .cloned();
        match heir {
            Some(id) => {
                self.names.insert(key.to_string(), id);
            }
            None => {
                self.names.remove(key);
            }
        }
    }

    /// Look up a device by id.
    #[must_use]
    pub fn get_by_id(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    /// Look up a device by name, case-insensitively.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Device> {
        self.names
            .get(&name_key(name))
            .and_then(|id| self.devices.get(id))
    }

    /// Every device, in first-seen order.
    #[must_use]
    pub fn all(&self) -> Vec<Device> {
        self.order
            .iter()
            .filter_map(|id| self.devices.get(id))
            .cloned()
            .collect()
    }

    /// Devices whose room matches `room`, case-insensitively.
    #[must_use]
    pub fn devices_in_room(&self, room: &str) -> Vec<Device> {
        let key = name_key(room);
        self.iter().filter(|d| name_key(&d.room) == key).cloned().collect()
    }

    /// Devices of the given kind.
    #[must_use]
    pub fn devices_of_kind(&self, kind: DeviceKind) -> Vec<Device> {
        self.iter().filter(|d| d.kind == kind).cloned().collect()
    }

    /// Distinct non-empty room labels, in first-seen order.
    #[must_use]
    pub fn rooms(&self) -> Vec<String> {
        let mut seen = Vec::<String>::new();
        for device in self.iter() {
            if device.room.trim().is_empty() {
                continue;
            }
            let key = name_key(&device.room);
            if !seen.iter().any(|r| name_key(r) == key) {
                seen.push(device.room.clone());
            }
        }
        seen
    }

    /// Number of devices currently on.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.devices.values().filter(|d| d.status).count()
    }

    /// Number of devices held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the registry holds no device.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Whether at least one snapshot has been applied.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn iter(&self) -> impl Iterator<Item = &Device> {
        self.order.iter().filter_map(|id| self.devices.get(id))
    }
}
