//! Targets that stand in for physical objects by logging what they are
//! asked to do.

use homemirror_app::capability::{Colorable, Commandable, Dimmable, Switchable, TargetError};
use homemirror_domain::color::{MediaCommand, Rgb};

/// Logs every capability call under the binding's name.
#[derive(Debug)]
pub struct LoggingTarget {
    name: String,
}

impl LoggingTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Switchable for LoggingTarget {
    fn turn_on(&self) -> Result<(), TargetError> {
        tracing::info!(object = %self.name, "switched on");
        Ok(())
    }

    fn turn_off(&self) -> Result<(), TargetError> {
        tracing::info!(object = %self.name, "switched off");
        Ok(())
    }
}

impl Dimmable for LoggingTarget {
    fn set_value(&self, value: u32) -> Result<(), TargetError> {
        tracing::info!(object = %self.name, value, "level set");
        Ok(())
    }
}

impl Colorable for LoggingTarget {
    fn set_color(&self, color: &str) -> Result<(), TargetError> {
        match Rgb::parse_hex(color) {
            Some(rgb) => tracing::info!(object = %self.name, color = %rgb, "painted"),
            None => tracing::warn!(object = %self.name, color, "unparsable color, keeping current"),
        }
        Ok(())
    }
}

impl Commandable for LoggingTarget {
    fn run_command(&self, token: &str) -> Result<(), TargetError> {
        match MediaCommand::parse(token) {
            Some(command) => tracing::info!(object = %self.name, ?command, "command run"),
            None => tracing::warn!(object = %self.name, token, "unknown command token"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_every_capability_call() {
        let target = LoggingTarget::new("Speaker");
        assert!(target.turn_on().is_ok());
        assert!(target.turn_off().is_ok());
        assert!(target.set_value(40).is_ok());
        assert!(target.set_color("#00FF00").is_ok());
        assert!(target.set_color("mauve").is_ok());
        assert!(target.run_command("PLAY").is_ok());
        assert!(target.run_command("shuffle").is_ok());
    }
}
