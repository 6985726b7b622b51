//! Object bridge: drives local targets from remote device state.
//!
//! Targets are bound by device *name* at configuration time. On every
//! snapshot the bridge resolves names to ids; afterwards each
//! `DeviceUpdated` event is routed by id to the bound target, and only the
//! capabilities whose flag changed are invoked.
//!
//! Initial state is deliberately not pushed to targets when devices load, so
//! physical objects do not move at startup.

use std::sync::{Mutex, MutexGuard, PoisonError};

use homemirror_domain::binding::BindingSpec;
use homemirror_domain::change::Changes;
use homemirror_domain::color::Signal;
use homemirror_domain::command::Command;
use homemirror_domain::device::Device;
use homemirror_domain::error::{MirrorError, SubscriberError};
use homemirror_domain::event::MirrorEvent;
use homemirror_domain::id::DeviceId;

use crate::capability::{Target, TargetError};
use crate::identity::{IdentityResolver, Resolution};
use crate::ports::{CommandSink, Subscriber};

const NAME: &str = "object_bridge";

/// Subscriber that routes device changes to capability targets.
pub struct ObjectBridge<C> {
    resolver: Mutex<IdentityResolver<Target>>,
    last_resolution: Mutex<Resolution>,
    sink: C,
}

impl<C: CommandSink> ObjectBridge<C> {
    /// Create a bridge that sends its own commands through `sink`.
    pub fn new(sink: C) -> Self {
        Self {
            resolver: Mutex::new(IdentityResolver::new()),
            last_resolution: Mutex::new(Resolution::default()),
            sink,
        }
    }

    /// Declare a binding from a device name to `target`.
    ///
    /// The declared capabilities are the ones `target` implements. The
    /// binding stays inert until the next snapshot names a matching device.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Validation`] when `name` is blank.
    pub fn bind(&self, name: impl Into<String>, target: Target) -> Result<(), MirrorError> {
        let spec = BindingSpec::new(name, target.capabilities());
        tracing::debug!(name = %spec.name, capabilities = ?spec.capabilities, "binding declared");
        lock(&self.resolver).declare(spec, target)
    }

    /// Id the binding declared under `name` currently resolves to.
    #[must_use]
    pub fn resolved_id(&self, name: &str) -> Option<DeviceId> {
        lock(&self.resolver)
            .by_name(name)
            .and_then(|binding| binding.id().cloned())
    }

    /// Whether the binding declared under `name` is armed.
    #[must_use]
    pub fn is_armed(&self, name: &str) -> bool {
        self.resolved_id(name).is_some()
    }

    /// Outcome of the most recent resolution.
    #[must_use]
    pub fn last_resolution(&self) -> Resolution {
        lock(&self.last_resolution).clone()
    }

    /// Ask the session to toggle the device bound under `name`.
    ///
    /// Returns `Ok(false)` without sending anything when the binding is
    /// unknown or inert.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn toggle(&self, name: &str) -> Result<bool, MirrorError> {
        self.send_to(name, |id| Command::Toggle { id })
    }

    /// Ask the session to set the level of the device bound under `name`.
    ///
    /// Returns `Ok(false)` without sending anything when the binding is
    /// unknown or inert.
    ///
    /// # Errors
    ///
    /// Propagates a transport error from the command sink.
    pub fn set_value(&self, name: &str, value: u32) -> Result<bool, MirrorError> {
        self.send_to(name, |id| Command::SetValue { id, value })
    }

    fn send_to(
        &self,
        name: &str,
        command: impl FnOnce(DeviceId) -> Command,
    ) -> Result<bool, MirrorError> {
        let Some(id) = self.resolved_id(name) else {
            tracing::warn!(name, "command addressed to an inert binding, ignoring");
            return Ok(false);
        };
        self.sink.send(command(id))?;
        Ok(true)
    }

    fn on_loaded(&self, devices: &[Device]) {
        let resolution = lock(&self.resolver).resolve(devices);
        tracing::info!(
            devices = devices.len(),
            armed = resolution.armed.len(),
            inert = resolution.inert.len(),
            "bindings resolved"
        );
        *lock(&self.last_resolution) = resolution;
    }

    fn on_updated(
        &self,
        event: &MirrorEvent,
        device: &Device,
        changes: Changes,
    ) -> Result<(), SubscriberError> {
        let target = {
            let resolver = lock(&self.resolver);
            let Some(binding) = resolver.route(&device.id) else {
                tracing::debug!(
                    device_id = %device.id,
                    name = %device.name,
                    "no binding for device"
                );
                return Ok(());
            };
            binding.target().clone()
        };

        let mut first_error: Option<TargetError> = None;
        let mut record = |result: Result<(), TargetError>| {
            if let Err(err) = result {
                tracing::warn!(device_id = %device.id, error = %err, "target rejected change");
                first_error.get_or_insert(err);
            }
        };

        if changes.status
            && let Some(switch) = &target.switch
        {
            tracing::debug!(device_id = %device.id, on = device.status, "switching target");
            record(if device.status {
                switch.turn_on()
            } else {
                switch.turn_off()
            });
        }
        if changes.value
            && let Some(dim) = &target.dim
        {
            tracing::debug!(device_id = %device.id, value = device.value, "dimming target");
            record(dim.set_value(device.value));
        }
        match event.signal() {
            Some(Signal::Color(color)) => {
                if let Some(colorable) = &target.color {
                    tracing::debug!(device_id = %device.id, %color, "painting target");
                    record(colorable.set_color(&color));
                }
            }
            Some(Signal::Command(token)) => {
                if let Some(commandable) = &target.command {
                    tracing::debug!(device_id = %device.id, %token, "running command on target");
                    record(commandable.run_command(&token));
                }
            }
            None => {}
        }

        match first_error {
            Some(err) => Err(SubscriberError::failed(NAME, err)),
            None => Ok(()),
        }
    }
}

impl<C: CommandSink> Subscriber for ObjectBridge<C> {
    fn name(&self) -> &str {
        NAME
    }

    fn on_event(&self, event: &MirrorEvent) -> Result<(), SubscriberError> {
        match event {
            MirrorEvent::DevicesLoaded { devices, .. } => {
                self.on_loaded(devices);
                Ok(())
            }
            MirrorEvent::DeviceUpdated {
                device, changes, ..
            } => self.on_updated(event, device, *changes),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::capability::{Colorable, Commandable, Dimmable, Switchable};

    #[derive(Default)]
    struct Lamp {
        calls: Mutex<Vec<String>>,
    }

    impl Lamp {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: String) -> Result<(), TargetError> {
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl Switchable for Lamp {
        fn turn_on(&self) -> Result<(), TargetError> {
            self.push("on".to_string())
        }
        fn turn_off(&self) -> Result<(), TargetError> {
            self.push("off".to_string())
        }
    }

    impl Dimmable for Lamp {
        fn set_value(&self, value: u32) -> Result<(), TargetError> {
            self.push(format!("value={value}"))
        }
    }

    impl Colorable for Lamp {
        fn set_color(&self, color: &str) -> Result<(), TargetError> {
            self.push(format!("color={color}"))
        }
    }

    impl Commandable for Lamp {
        fn run_command(&self, token: &str) -> Result<(), TargetError> {
            self.push(format!("cmd={token}"))
        }
    }

    struct Broken;

    impl Switchable for Broken {
        fn turn_on(&self) -> Result<(), TargetError> {
            Err("relay stuck".into())
        }
        fn turn_off(&self) -> Result<(), TargetError> {
            Err("relay stuck".into())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Command>>,
    }

    impl CommandSink for RecordingSink {
        fn send(&self, command: Command) -> Result<(), MirrorError> {
            self.sent.lock().unwrap().push(command);
            Ok(())
        }
    }

    fn full_target(lamp: &Arc<Lamp>) -> Target {
        Target::new()
            .switchable(Arc::clone(lamp) as Arc<dyn Switchable>)
            .dimmable(Arc::clone(lamp) as Arc<dyn Dimmable>)
            .colorable(Arc::clone(lamp) as Arc<dyn Colorable>)
            .commandable(Arc::clone(lamp) as Arc<dyn Commandable>)
    }

    fn device(status: bool, value: u32, color: &str) -> Device {
        Device::builder()
            .id("d1")
            .name("main light")
            .status(status)
            .value(value)
            .color(color)
            .build()
            .unwrap()
    }

    fn loaded_bridge(lamp: &Arc<Lamp>) -> ObjectBridge<Arc<RecordingSink>> {
        let bridge = ObjectBridge::new(Arc::new(RecordingSink::default()));
        bridge.bind("Main Light", full_target(lamp)).unwrap();
        bridge
            .on_event(&MirrorEvent::loaded(vec![device(false, 0, "")]))
            .unwrap();
        bridge
    }

    #[test]
    fn should_arm_binding_on_load_without_touching_target() {
        let lamp = Arc::new(Lamp::default());
        let bridge = loaded_bridge(&lamp);
        assert_eq!(bridge.resolved_id("MAIN LIGHT"), Some(DeviceId::from("d1")));
        assert!(lamp.calls().is_empty());
    }

    #[test]
    fn should_invoke_each_changed_capability() {
        let lamp = Arc::new(Lamp::default());
        let bridge = loaded_bridge(&lamp);

        bridge
            .on_event(&MirrorEvent::updated(device(true, 80, "#FFAA00"), Changes::ALL))
            .unwrap();

        assert_eq!(lamp.calls(), vec!["on", "value=80", "color=#FFAA00"]);
    }

    #[test]
    fn should_invoke_only_flagged_capabilities() {
        let lamp = Arc::new(Lamp::default());
        let bridge = loaded_bridge(&lamp);
        let changes = Changes {
            value: true,
            ..Changes::NONE
        };

        bridge
            .on_event(&MirrorEvent::updated(device(true, 30, "#FFAA00"), changes))
            .unwrap();

        assert_eq!(lamp.calls(), vec!["value=30"]);
    }

    #[test]
    fn should_route_command_token_to_commandable() {
        let lamp = Arc::new(Lamp::default());
        let bridge = loaded_bridge(&lamp);
        let changes = Changes {
            color: true,
            ..Changes::NONE
        };

        bridge
            .on_event(&MirrorEvent::updated(device(false, 0, "CMD:PLAY"), changes))
            .unwrap();

        assert_eq!(lamp.calls(), vec!["cmd=PLAY"]);
    }

    #[test]
    fn should_skip_capabilities_target_lacks() {
        let lamp = Arc::new(Lamp::default());
        let bridge = ObjectBridge::new(Arc::new(RecordingSink::default()));
        bridge
            .bind(
                "Main Light",
                Target::new().switchable(Arc::clone(&lamp) as Arc<dyn Switchable>),
            )
            .unwrap();
        bridge
            .on_event(&MirrorEvent::loaded(vec![device(false, 0, "")]))
            .unwrap();

        bridge
            .on_event(&MirrorEvent::updated(device(true, 80, "#FFAA00"), Changes::ALL))
            .unwrap();

        assert_eq!(lamp.calls(), vec!["on"]);
    }

    #[test]
    fn should_ignore_updates_for_unbound_devices() {
        let lamp = Arc::new(Lamp::default());
        let bridge = loaded_bridge(&lamp);
        let other = Device::builder().id("d9").name("Garage").build().unwrap();

        bridge
            .on_event(&MirrorEvent::updated(other, Changes::ALL))
            .unwrap();

        assert!(lamp.calls().is_empty());
    }

    #[test]
    fn should_report_target_failure_as_subscriber_error() {
        let bridge = ObjectBridge::new(Arc::new(RecordingSink::default()));
        bridge
            .bind("Main Light", Target::new().switchable(Arc::new(Broken)))
            .unwrap();
        bridge
            .on_event(&MirrorEvent::loaded(vec![device(false, 0, "")]))
            .unwrap();

        let result = bridge.on_event(&MirrorEvent::updated(device(true, 0, ""), Changes::ALL));

        assert!(matches!(result, Err(SubscriberError::Failed { .. })));
    }

    #[test]
    fn should_send_toggle_for_armed_binding() {
        let sink = Arc::new(RecordingSink::default());
        let bridge = ObjectBridge::new(Arc::clone(&sink));
        bridge.bind("Main Light", Target::new()).unwrap();
        bridge
            .on_event(&MirrorEvent::loaded(vec![device(false, 0, "")]))
            .unwrap();

        assert!(bridge.toggle("main light").unwrap());
        assert_eq!(
            *sink.sent.lock().unwrap(),
            vec![Command::Toggle {
                id: DeviceId::from("d1")
            }]
        );
    }

    #[test]
    fn should_not_send_for_inert_binding() {
        let sink = Arc::new(RecordingSink::default());
        let bridge = ObjectBridge::new(Arc::clone(&sink));
        bridge.bind("Kitchen Light", Target::new()).unwrap();
        bridge
            .on_event(&MirrorEvent::loaded(vec![device(false, 0, "")]))
            .unwrap();

        assert!(!bridge.toggle("kitchen light").unwrap());
        assert!(!bridge.set_value("kitchen light", 10).unwrap());
        assert!(sink.sent.lock().unwrap().is_empty());
        assert_eq!(
            bridge.last_resolution().inert,
            vec!["Kitchen Light".to_string()]
        );
    }
}
