//! Device: the last-known state of a remote smart-home device.

use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, ValidationError};
use crate::id::DeviceId;

/// Category of a device; decides which optional fields are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Thermostat,
    Door,
    Camera,
    Sensor,
    #[default]
    #[serde(other)]
    Other,
}

impl DeviceKind {
    /// Parse a free-form type label, case-insensitively.
    ///
    /// Anything unrecognised maps to [`Other`](Self::Other).
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "light" => Self::Light,
            "thermostat" => Self::Thermostat,
            "door" => Self::Door,
            "camera" => Self::Camera,
            "sensor" => Self::Sensor,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Thermostat => f.write_str("thermostat"),
            Self::Door => f.write_str("door"),
            Self::Camera => f.write_str("camera"),
            Self::Sensor => f.write_str("sensor"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// A device as last reported by the remote source.
///
/// Missing fields are represented by explicit defaults: an empty `room`,
/// a `value` of 0 and an empty `color` (meaning "not specified").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: DeviceKind,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub value: u32,
    #[serde(default)]
    pub color: String,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Validation`] when `id` is empty.
    pub fn validate(&self) -> Result<(), MirrorError> {
        if self.id.is_empty() {
            return Err(ValidationError::EmptyId.into());
        }
        Ok(())
    }

    /// Lowercased name used as the key of case-insensitive lookups.
    #[must_use]
    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }
}

/// Normalise a display name into its lookup key.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    kind: DeviceKind,
    room: String,
    status: bool,
    value: u32,
    color: String,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    #[must_use]
    pub fn status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Validation`] if `id` is missing or empty.
    pub fn build(self) -> Result<Device, MirrorError> {
        let device = Device {
            id: self.id.unwrap_or_else(|| DeviceId::new("")),
            name: self.name.unwrap_or_default(),
            kind: self.kind,
            room: self.room,
            status: self.status,
            value: self.value,
            color: self.color,
        };
        device.validate()?;
        Ok(device)
    }
}
