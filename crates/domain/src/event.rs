//! Event: what the dispatch bus delivers to subscribers.
//!
//! Two kinds exist: a full reload after a snapshot, and a single-device
//! update carrying the flags that actually changed.

use serde::{Deserialize, Serialize};

use crate::change::Changes;
use crate::color::Signal;
use crate::device::Device;
use crate::time::{Timestamp, now};

/// An event fired by the mirror after its registry changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MirrorEvent {
    /// A snapshot was applied. Fired exactly once per snapshot.
    DevicesLoaded {
        devices: Vec<Device>,
        timestamp: Timestamp,
    },
    /// A single update changed at least one field.
    DeviceUpdated {
        device: Device,
        changes: Changes,
        timestamp: Timestamp,
    },
}

impl MirrorEvent {
    /// Build a [`DevicesLoaded`](Self::DevicesLoaded) event stamped now.
    #[must_use]
    pub fn loaded(devices: Vec<Device>) -> Self {
        Self::DevicesLoaded {
            devices,
            timestamp: now(),
        }
    }

    /// Build a [`DeviceUpdated`](Self::DeviceUpdated) event stamped now.
    #[must_use]
    pub fn updated(device: Device, changes: Changes) -> Self {
        Self::DeviceUpdated {
            device,
            changes,
            timestamp: now(),
        }
    }

    /// Decoded color channel of an update whose color flag is set.
    ///
    /// `None` for loads, for updates that did not change the color, and for
    /// an empty color field.
    #[must_use]
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Self::DeviceUpdated {
                device, changes, ..
            } if changes.color => Signal::decode(&device.color),
            _ => None,
        }
    }

    /// Short name of the event kind, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DevicesLoaded { .. } => "devices_loaded",
            Self::DeviceUpdated { .. } => "device_updated",
        }
    }
}
