//! Changed-flags: which semantic fields differ between two device states.
//!
//! Each flag drives a different downstream effect (actuation, level,
//! color/command), so they are computed independently and never coalesced.

use serde::{Deserialize, Serialize};

use crate::device::Device;

/// Per-field change flags produced by comparing a stored device with an
/// incoming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Changes {
    pub status: bool,
    pub value: bool,
    pub color: bool,
}

impl Changes {
    /// Every field changed; used for devices seen for the first time.
    pub const ALL: Self = Self {
        status: true,
        value: true,
        color: true,
    };

    /// Nothing changed.
    pub const NONE: Self = Self {
        status: false,
        value: false,
        color: false,
    };

    /// Compare `incoming` against the `previous` record with the same id.
    ///
    /// A missing `previous` means the device is new, and every field counts
    /// as changed. Otherwise:
    /// - `status` and `value` change on any difference (no threshold);
    /// - `color` changes only when `incoming.color` is non-empty and differs.
    ///   An empty incoming color means "not specified", never "cleared".
    #[must_use]
    pub fn between(previous: Option<&Device>, incoming: &Device) -> Self {
        let Some(previous) = previous else {
            return Self::ALL;
        };
        Self {
            status: previous.status != incoming.status,
            value: previous.value != incoming.value,
            color: !incoming.color.is_empty() && previous.color != incoming.color,
        }
    }

    /// Whether at least one flag is set.
    #[must_use]
    pub fn any(self) -> bool {
        self.status || self.value || self.color
    }
}

/// Build the record to store after applying `incoming` on top of `previous`.
///
/// The incoming record replaces the previous one wholesale, except that an
/// empty incoming color keeps the previously known color.
#[must_use]
pub fn merge(previous: Option<&Device>, mut incoming: Device) -> Device {
    if incoming.color.is_empty()
        && let Some(previous) = previous
    {
        incoming.color.clone_from(&previous.color);
    }
    incoming
}
