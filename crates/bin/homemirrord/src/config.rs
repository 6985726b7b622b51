//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `homemirror.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;

use homemirror_adapter_wire_json::Credentials;
use homemirror_app::mirror::SnapshotMode;
use homemirror_domain::binding::{BindingSpec, Capability};

/// Session path meaning "read from standard input".
pub const STDIN: &str = "-";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Recorded session to replay.
    pub session: SessionConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Dispatch and snapshot behaviour.
    pub bus: BusConfig,
    /// Named objects bound to devices.
    pub bindings: Vec<BindingConfig>,
}

/// Where the session comes from and how to log in.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of a line-delimited JSON recording, or `-` for stdin.
    pub path: String,
    /// Username sent after `CONNECTED`; no login when unset.
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Snapshot handling.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Rebuild the registry from each snapshot instead of merging into it.
    pub snapshot_clears_registry: bool,
}

/// One `[[bindings]]` entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Device name to look for, case-insensitively.
    pub name: String,
    /// Capability keywords: `switch`, `dim`, `color`, `command`.
    pub capabilities: Vec<String>,
}

impl Config {
    /// Load configuration from `homemirror.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// binding is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homemirror.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMEMIRROR_SESSION") {
            self.session.path = val;
        }
        if let Ok(val) = std::env::var("HOMEMIRROR_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "session path must not be empty".to_string(),
            ));
        }
        self.binding_specs().map(|_| ())
    }

    /// Binding declarations with their capability keywords parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a blank name or an unknown
    /// capability keyword.
    pub fn binding_specs(&self) -> Result<Vec<BindingSpec>, ConfigError> {
        self.bindings
            .iter()
            .map(|binding| {
                let capabilities = binding
                    .capabilities
                    .iter()
                    .map(|word| word.parse::<Capability>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|err| {
                        ConfigError::Validation(format!("binding `{}`: {err}", binding.name))
                    })?;
                let spec = BindingSpec::new(binding.name.clone(), capabilities);
                spec.validate().map_err(|_| {
                    ConfigError::Validation("binding name must not be empty".to_string())
                })?;
                Ok(spec)
            })
            .collect()
    }

    /// How snapshots treat previously known devices.
    #[must_use]
    pub fn snapshot_mode(&self) -> SnapshotMode {
        if self.bus.snapshot_clears_registry {
            SnapshotMode::Replace
        } else {
            SnapshotMode::Merge
        }
    }

    /// Login credentials, when a username is configured.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.session.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.session.password.clone().unwrap_or_default(),
        })
    }

    /// Whether the session is read from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.session.path == STDIN
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: STDIN.to_string(),
            username: None,
            password: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homemirrord=info,homemirror=info".to_string(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            snapshot_clears_registry: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
