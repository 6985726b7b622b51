//! Line codec for the remote session protocol.
//!
//! Every message is one JSON object keyed by `action`. The server is
//! loosely typed: device lists may arrive JSON-encoded inside a string,
//! `status` may be a bool or the string `"true"`, and `value` may be a
//! number or a numeric string. Decoding absorbs all of that so the engine
//! only ever sees well-formed [`Device`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use homemirror_domain::command::Command;
use homemirror_domain::device::{Device, DeviceKind};
use homemirror_domain::id::DeviceId;

use crate::error::WireError;

const UNKNOWN_NAME: &str = "Unknown";

/// A decoded incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The server accepted the socket.
    Connected,
    /// Credentials were accepted.
    LoginSucceeded { username: String },
    /// Credentials were rejected.
    LoginFailed { message: Option<String> },
    /// Authoritative device list.
    Snapshot(Vec<Device>),
    /// Single-device change.
    Update(Device),
    /// An action this codec does not handle.
    Ignored { action: String },
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    action: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    devices: Value,
    #[serde(default)]
    device: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDevice {
    id: Value,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    room: Option<String>,
    status: Value,
    value: Value,
    color: Option<String>,
}

impl RawDevice {
    fn into_device(self) -> Result<Device, WireError> {
        let id = match self.id {
            Value::String(id) => id,
            Value::Number(id) => id.to_string(),
            _ => String::new(),
        };
        if id.trim().is_empty() {
            return Err(WireError::MissingId);
        }
        Ok(Device {
            id: DeviceId::new(id),
            name: self.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            kind: self
                .kind
                .as_deref()
                .map_or(DeviceKind::Other, DeviceKind::from_label),
            room: self.room.unwrap_or_default(),
            status: lenient_bool(&self.status),
            value: lenient_level(&self.value),
            color: self.color.unwrap_or_default(),
        })
    }
}

fn lenient_bool(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => text.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Integers only; negatives clamp to 0, anything unparsable reads as 0.
fn lenient_level(value: &Value) -> u32 {
    let raw = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    raw.map_or(0, |level| {
        u32::try_from(level.max(0)).unwrap_or(u32::MAX)
    })
}

/// Payloads that may be either inline JSON or a JSON document inside a
/// string.
fn unwrap_embedded(value: Value) -> Result<Value, WireError> {
    match value {
        Value::String(text) => Ok(serde_json::from_str(&text)?),
        other => Ok(other),
    }
}

fn decode_device_list(devices: Value) -> Result<Vec<Device>, WireError> {
    if devices.is_null() {
        return Err(WireError::MissingField {
            action: "DEVICES_LIST",
            field: "devices",
        });
    }
    let raw: Vec<RawDevice> = serde_json::from_value(unwrap_embedded(devices)?)?;
    let mut list = Vec::with_capacity(raw.len());
    for entry in raw {
        match entry.into_device() {
            Ok(device) => list.push(device),
            Err(err) => tracing::warn!(error = %err, "skipping device list entry"),
        }
    }
    Ok(list)
}

fn decode_device(device: Value) -> Result<Device, WireError> {
    if device.is_null() {
        return Err(WireError::MissingField {
            action: "DEVICE_UPDATED",
            field: "device",
        });
    }
    let raw: RawDevice = serde_json::from_value(unwrap_embedded(device)?)?;
    raw.into_device()
}

/// Decode one incoming line.
///
/// # Errors
///
/// Returns [`WireError::Malformed`] for invalid JSON,
/// [`WireError::MissingField`] when a device payload is absent and
/// [`WireError::MissingId`] for an update whose device has no id. Entries
/// without an id inside a device list are skipped with a warning instead.
pub fn decode(line: &str) -> Result<Inbound, WireError> {
    let envelope: Envelope = serde_json::from_str(line)?;
    let inbound = match envelope.action.as_str() {
        "CONNECTED" => Inbound::Connected,
        "LOGIN_SUCCESS" => Inbound::LoginSucceeded {
            username: envelope.username.unwrap_or_default(),
        },
        "LOGIN_FAILED" => Inbound::LoginFailed {
            message: envelope.message,
        },
        "DEVICES_LIST" => Inbound::Snapshot(decode_device_list(envelope.devices)?),
        "DEVICE_UPDATED" | "DEVICE_CHANGED" => Inbound::Update(decode_device(envelope.device)?),
        other => {
            tracing::debug!(action = other, "ignoring unhandled action");
            Inbound::Ignored {
                action: other.to_string(),
            }
        }
    };
    Ok(inbound)
}

#[derive(Debug, Serialize)]
#[serde(tag = "action")]
enum Outbound<'a> {
    #[serde(rename = "DEVICE_CONTROL")]
    DeviceControl {
        #[serde(rename = "deviceId")]
        device_id: &'a str,
        command: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<&'a str>,
    },
    #[serde(rename = "GET_DEVICES")]
    GetDevices,
    #[serde(rename = "LOGIN")]
    Login { username: &'a str, password: &'a str },
}

impl<'a> Outbound<'a> {
    fn control(id: &'a DeviceId, command: &'static str) -> Self {
        Self::DeviceControl {
            device_id: id.as_str(),
            command,
            value: None,
            color: None,
        }
    }
}

/// Encode an outbound command as a single wire line (without the newline).
///
/// Levels travel as strings, the way the server expects them.
///
/// # Errors
///
/// Returns [`WireError::Malformed`] if serialization fails.
pub fn encode_command(command: &Command) -> Result<String, WireError> {
    let outbound = match command {
        Command::Toggle { id } => Outbound::control(id, "TOGGLE"),
        Command::TurnOn { id } => Outbound::control(id, "ON"),
        Command::TurnOff { id } => Outbound::control(id, "OFF"),
        Command::SetValue { id, value } => Outbound::DeviceControl {
            device_id: id.as_str(),
            command: "SET_VALUE",
            value: Some(value.to_string()),
            color: None,
        },
        Command::SetColor { id, color } => Outbound::DeviceControl {
            device_id: id.as_str(),
            command: "SET_COLOR",
            value: None,
            color: Some(color.as_str()),
        },
        Command::RefreshAll => Outbound::GetDevices,
    };
    Ok(serde_json::to_string(&outbound)?)
}

/// Encode the login request sent after `CONNECTED`.
///
/// # Errors
///
/// Returns [`WireError::Malformed`] if serialization fails.
pub fn encode_login(username: &str, password: &str) -> Result<String, WireError> {
    Ok(serde_json::to_string(&Outbound::Login { username, password })?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decode_session_notices() {
        assert_eq!(decode(r#"{"action":"CONNECTED"}"#).unwrap(), Inbound::Connected);
        assert_eq!(
            decode(r#"{"action":"LOGIN_SUCCESS","username":"admin"}"#).unwrap(),
            Inbound::LoginSucceeded {
                username: "admin".to_string()
            }
        );
        assert_eq!(
            decode(r#"{"action":"LOGIN_FAILED","message":"bad password"}"#).unwrap(),
            Inbound::LoginFailed {
                message: Some("bad password".to_string())
            }
        );
    }

    #[test]
    fn should_decode_device_list_array() {
        let line = r##"{"action":"DEVICES_LIST","devices":[
            {"id":"d1","name":"Main Light","type":"light","room":"Living","status":true,"value":80,"color":"#FFAA00"},
            {"id":"d2","name":"Front Door","type":"door"}
        ]}"##;

        let Inbound::Snapshot(devices) = decode(line).unwrap() else {
            panic!("expected snapshot");
        };

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].kind, DeviceKind::Light);
        assert_eq!(devices[0].value, 80);
        assert_eq!(devices[0].color, "#FFAA00");
        assert_eq!(devices[1].room, "");
        assert!(!devices[1].status);
        assert_eq!(devices[1].color, "");
    }

    #[test]
    fn should_decode_device_list_embedded_in_string() {
        let line = r#"{"action":"DEVICES_LIST","devices":"[{\"id\":\"d1\",\"name\":\"Fan\"}]"}"#;
        let Inbound::Snapshot(devices) = decode(line).unwrap() else {
            panic!("expected snapshot");
        };
        assert_eq!(devices[0].id.as_str(), "d1");
    }

    #[test]
    fn should_skip_list_entries_without_id() {
        let line = r#"{"action":"DEVICES_LIST","devices":[{"name":"Ghost"},{"id":"d1"}]}"#;
        let Inbound::Snapshot(devices) = decode(line).unwrap() else {
            panic!("expected snapshot");
        };
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Unknown");
    }

    #[test]
    fn should_accept_loose_status_and_value() {
        let line = r#"{"action":"DEVICE_CHANGED","device":{"id":7,"status":"true","value":"42"}}"#;
        let Inbound::Update(device) = decode(line).unwrap() else {
            panic!("expected update");
        };
        assert_eq!(device.id.as_str(), "7");
        assert!(device.status);
        assert_eq!(device.value, 42);
        assert_eq!(device.kind, DeviceKind::Other);
    }

    #[test]
    fn should_clamp_negative_and_garbage_levels_to_zero() {
        assert_eq!(lenient_level(&Value::from(-5)), 0);
        assert_eq!(lenient_level(&Value::from("warm")), 0);
        assert_eq!(lenient_level(&Value::from(12.5)), 0);
        assert_eq!(lenient_level(&Value::Null), 0);
    }

    #[test]
    fn should_reject_update_without_id() {
        let line = r#"{"action":"DEVICE_UPDATED","device":{"name":"Ghost"}}"#;
        assert!(matches!(decode(line), Err(WireError::MissingId)));
    }

    #[test]
    fn should_reject_update_without_device() {
        let line = r#"{"action":"DEVICE_UPDATED"}"#;
        assert!(matches!(decode(line), Err(WireError::MissingField { .. })));
    }

    #[test]
    fn should_reject_malformed_json() {
        assert!(matches!(decode("not json"), Err(WireError::Malformed(_))));
    }

    #[test]
    fn should_ignore_unknown_actions() {
        assert_eq!(
            decode(r#"{"action":"ROOMS_LIST","rooms":[]}"#).unwrap(),
            Inbound::Ignored {
                action: "ROOMS_LIST".to_string()
            }
        );
    }

    #[test]
    fn should_encode_device_control_commands() {
        let id = DeviceId::from("d1");
        assert_eq!(
            encode_command(&Command::Toggle { id: id.clone() }).unwrap(),
            r#"{"action":"DEVICE_CONTROL","deviceId":"d1","command":"TOGGLE"}"#
        );
        assert_eq!(
            encode_command(&Command::SetValue {
                id: id.clone(),
                value: 80
            })
            .unwrap(),
            r#"{"action":"DEVICE_CONTROL","deviceId":"d1","command":"SET_VALUE","value":"80"}"#
        );
        assert_eq!(
            encode_command(&Command::SetColor {
                id,
                color: "CMD:PLAY".to_string()
            })
            .unwrap(),
            r#"{"action":"DEVICE_CONTROL","deviceId":"d1","command":"SET_COLOR","color":"CMD:PLAY"}"#
        );
    }

    #[test]
    fn should_encode_refresh_and_login() {
        assert_eq!(
            encode_command(&Command::RefreshAll).unwrap(),
            r#"{"action":"GET_DEVICES"}"#
        );
        assert_eq!(
            encode_login("admin", "secret").unwrap(),
            r#"{"action":"LOGIN","username":"admin","password":"secret"}"#
        );
    }
}
