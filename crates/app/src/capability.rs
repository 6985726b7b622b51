//! Capability interfaces implemented by bridge targets.
//!
//! A binding declares which of these its target implements; the bridge calls
//! the matching method directly when the corresponding flag changes.

use std::sync::Arc;

use homemirror_domain::binding::Capability;

/// Error a target may raise from a capability call.
pub type TargetError = Box<dyn std::error::Error + Send + Sync>;

/// Turn on / turn off.
pub trait Switchable: Send + Sync {
    /// # Errors
    /// Returns a [`TargetError`] when the target cannot switch on.
    fn turn_on(&self) -> Result<(), TargetError>;

    /// # Errors
    /// Returns a [`TargetError`] when the target cannot switch off.
    fn turn_off(&self) -> Result<(), TargetError>;
}

/// Set a numeric level (brightness, setpoint, volume, …).
pub trait Dimmable: Send + Sync {
    /// # Errors
    /// Returns a [`TargetError`] when the level cannot be applied.
    fn set_value(&self, value: u32) -> Result<(), TargetError>;
}

/// Paint a color.
pub trait Colorable: Send + Sync {
    /// # Errors
    /// Returns a [`TargetError`] when the color cannot be applied.
    fn set_color(&self, color: &str) -> Result<(), TargetError>;
}

/// Run an opaque command token carried on the color channel.
pub trait Commandable: Send + Sync {
    /// # Errors
    /// Returns a [`TargetError`] when the command fails.
    fn run_command(&self, token: &str) -> Result<(), TargetError>;
}

/// The set of capability handles a binding drives.
#[derive(Default, Clone)]
pub struct Target {
    pub switch: Option<Arc<dyn Switchable>>,
    pub dim: Option<Arc<dyn Dimmable>>,
    pub color: Option<Arc<dyn Colorable>>,
    pub command: Option<Arc<dyn Commandable>>,
}

impl Target {
    /// A target with no capability.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn switchable(mut self, handle: Arc<dyn Switchable>) -> Self {
        self.switch = Some(handle);
        self
    }

    #[must_use]
    pub fn dimmable(mut self, handle: Arc<dyn Dimmable>) -> Self {
        self.dim = Some(handle);
        self
    }

    #[must_use]
    pub fn colorable(mut self, handle: Arc<dyn Colorable>) -> Self {
        self.color = Some(handle);
        self
    }

    #[must_use]
    pub fn commandable(mut self, handle: Arc<dyn Commandable>) -> Self {
        self.command = Some(handle);
        self
    }

    /// Capabilities this target implements, in a fixed order.
    #[must_use]
    pub fn capabilities(&self) -> Vec<Capability> {
        [
            (self.switch.is_some(), Capability::Switch),
            (self.dim.is_some(), Capability::Dim),
            (self.color.is_some(), Capability::Color),
            (self.command.is_some(), Capability::Command),
        ]
        .into_iter()
        .filter_map(|(present, cap)| present.then_some(cap))
        .collect()
    }
}

/// A type implementing all four capabilities, narrowed to the listed ones.
///
/// Handy for targets configured from a capability list.
pub fn target_for<T>(handle: &Arc<T>, capabilities: &[Capability]) -> Target
where
    T: Switchable + Dimmable + Colorable + Commandable + 'static,
{
    let mut target = Target::new();
    for capability in capabilities {
        target = match capability {
            Capability::Switch => target.switchable(Arc::clone(handle) as Arc<dyn Switchable>),
            Capability::Dim => target.dimmable(Arc::clone(handle) as Arc<dyn Dimmable>),
            Capability::Color => target.colorable(Arc::clone(handle) as Arc<dyn Colorable>),
            Capability::Command => target.commandable(Arc::clone(handle) as Arc<dyn Commandable>),
        };
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Null;

    impl Switchable for Null {
        fn turn_on(&self) -> Result<(), TargetError> {
            Ok(())
        }
        fn turn_off(&self) -> Result<(), TargetError> {
            Ok(())
        }
    }

    impl Dimmable for Null {
        fn set_value(&self, _value: u32) -> Result<(), TargetError> {
            Ok(())
        }
    }

    impl Colorable for Null {
        fn set_color(&self, _color: &str) -> Result<(), TargetError> {
            Ok(())
        }
    }

    impl Commandable for Null {
        fn run_command(&self, _token: &str) -> Result<(), TargetError> {
            Ok(())
        }
    }

    #[test]
    fn should_report_no_capability_for_empty_target() {
        assert!(Target::new().capabilities().is_empty());
    }

    #[test]
    fn should_narrow_target_to_listed_capabilities() {
        let handle = Arc::new(Null);
        let target = target_for(&handle, &[Capability::Command, Capability::Switch]);
        assert_eq!(
            target.capabilities(),
            vec![Capability::Switch, Capability::Command]
        );
        assert!(target.dim.is_none());
    }
}
