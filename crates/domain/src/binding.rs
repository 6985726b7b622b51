//! Binding: a configuration-time declaration linking a device *name* to
//! the capabilities of a local target.
//!
//! The runtime id is unknown until a snapshot arrives; resolution happens in
//! the application layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::change::Changes;
use crate::device::name_key;
use crate::error::{MirrorError, ValidationError};

/// Something a bound target knows how to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Turn on / turn off. Reacts to the status flag.
    Switch,
    /// Set a numeric level. Reacts to the value flag.
    Dim,
    /// Paint a color. Reacts to the color flag when it carries a color.
    Color,
    /// Run a command token. Reacts to the color flag when it carries a command.
    Command,
}

impl Capability {
    /// Whether this capability has work to do for the given flags.
    #[must_use]
    pub fn reacts_to(self, changes: Changes) -> bool {
        match self {
            Self::Switch => changes.status,
            Self::Dim => changes.value,
            Self::Color | Self::Command => changes.color,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch => f.write_str("switch"),
            Self::Dim => f.write_str("dim"),
            Self::Color => f.write_str("color"),
            Self::Command => f.write_str("command"),
        }
    }
}

impl FromStr for Capability {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "switch" => Ok(Self::Switch),
            "dim" => Ok(Self::Dim),
            "color" => Ok(Self::Color),
            "command" => Ok(Self::Command),
            other => Err(ValidationError::UnknownCapability(other.to_string())),
        }
    }
}

/// Declaration of a binding: the device name to look for and which
/// capabilities its target implements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

impl BindingSpec {
    /// Create a declaration for `name` with the given capabilities.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Validation`] when `name` is blank.
    pub fn validate(&self) -> Result<(), MirrorError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyBindingName.into());
        }
        Ok(())
    }

    /// Case-insensitive lookup key for the declared name.
    #[must_use]
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    /// Whether the target declares `capability`.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_capability_keywords() {
        assert_eq!("Switch".parse::<Capability>(), Ok(Capability::Switch));
        assert_eq!(" dim ".parse::<Capability>(), Ok(Capability::Dim));
        assert_eq!(
            "fly".parse::<Capability>(),
            Err(ValidationError::UnknownCapability("fly".to_string()))
        );
    }

    #[test]
    fn should_map_capabilities_to_flags() {
        let only_value = Changes {
            value: true,
            ..Changes::NONE
        };
        assert!(Capability::Dim.reacts_to(only_value));
        assert!(!Capability::Switch.reacts_to(only_value));
        assert!(!Capability::Command.reacts_to(only_value));
    }

    #[test]
    fn should_reject_blank_binding_name() {
        let spec = BindingSpec::new("  ", [Capability::Switch]);
        assert!(matches!(
            spec.validate(),
            Err(MirrorError::Validation(ValidationError::EmptyBindingName))
        ));
    }

    #[test]
    fn should_lowercase_binding_key() {
        let spec = BindingSpec::new("Main Light", [Capability::Switch]);
        assert_eq!(spec.key(), "main light");
        assert!(spec.has(Capability::Switch));
        assert!(!spec.has(Capability::Dim));
    }

    #[test]
    fn should_deserialize_from_toml_style_json() {
        let spec: BindingSpec =
            serde_json::from_str(r#"{"name":"Speaker","capabilities":["switch","command"]}"#)
                .unwrap();
        assert_eq!(spec.capabilities, vec![Capability::Switch, Capability::Command]);
    }
}
