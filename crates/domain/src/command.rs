//! Command: an outbound, fire-and-forget request to the remote session.
//!
//! The engine never tracks acknowledgement: the effect is confirmed by a
//! later update for the same device.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// A request the mirror asks the session collaborator to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Toggle { id: DeviceId },
    TurnOn { id: DeviceId },
    TurnOff { id: DeviceId },
    SetValue { id: DeviceId, value: u32 },
    SetColor { id: DeviceId, color: String },
    /// Ask for a fresh snapshot.
    RefreshAll,
}

impl Command {
    /// Device targeted by this command, if any.
    #[must_use]
    pub fn target(&self) -> Option<&DeviceId> {
        match self {
            Self::Toggle { id }
            | Self::TurnOn { id }
            | Self::TurnOff { id }
            | Self::SetValue { id, .. }
            | Self::SetColor { id, .. } => Some(id),
            Self::RefreshAll => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Toggle { id } => write!(f, "toggle({id})"),
            Self::TurnOn { id } => write!(f, "turn_on({id})"),
            Self::TurnOff { id } => write!(f, "turn_off({id})"),
            Self::SetValue { id, value } => write!(f, "set_value({id}, {value})"),
            Self::SetColor { id, color } => write!(f, "set_color({id}, {color})"),
            Self::RefreshAll => f.write_str("refresh_all"),
        }
    }
}
