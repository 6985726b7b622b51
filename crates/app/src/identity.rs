//! Identity resolver: binds names declared at configuration time to the ids
//! the remote source assigns at load time.
//!
//! Bindings start inert (no id). Each snapshot re-resolves every binding by
//! case-insensitive name; matched bindings become armed and are indexed by id
//! for O(1) routing of later updates.

use std::collections::HashMap;

use homemirror_domain::binding::BindingSpec;
use homemirror_domain::device::{Device, name_key};
use homemirror_domain::error::MirrorError;
use homemirror_domain::id::DeviceId;

/// A declared binding and its current resolution.
#[derive(Debug)]
pub struct Binding<T> {
    spec: BindingSpec,
    id: Option<DeviceId>,
    target: T,
}

impl<T> Binding<T> {
    /// The declaration this binding was created from.
    #[must_use]
    pub fn spec(&self) -> &BindingSpec {
        &self.spec
    }

    /// Resolved device id, `None` while inert.
    #[must_use]
    pub fn id(&self) -> Option<&DeviceId> {
        self.id.as_ref()
    }

    /// The local target the binding drives.
    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Whether the binding has been resolved to a device.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.id.is_some()
    }
}

/// Result of resolving bindings against a device list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Declared name and the id it resolved to.
    pub armed: Vec<(String, DeviceId)>,
    /// Declared names that matched no device.
    pub inert: Vec<String>,
}

/// Name → id resolver with id-indexed routing.
#[derive(Debug)]
pub struct IdentityResolver<T> {
    bindings: Vec<Binding<T>>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<DeviceId, usize>,
}

impl<T> Default for IdentityResolver<T> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
            by_name: HashMap::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T> IdentityResolver<T> {
    /// Create a resolver with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a binding. It stays inert until the next [`resolve`](Self::resolve).
    ///
    /// Declaring the same name twice (case-insensitively) replaces the
    /// earlier declaration.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Validation`] when the declared name is blank.
    pub fn declare(&mut self, spec: BindingSpec, target: T) -> Result<(), MirrorError> {
        spec.validate()?;
        let key = spec.key();
        let binding = Binding {
            spec,
            id: None,
            target,
        };
        if let Some(&idx) = self.by_name.get(&key) {
            if let Some(old) = self.bindings[idx].id.take() {
                self.by_id.remove(&old);
            }
            self.bindings[idx] = binding;
        } else {
            self.by_name.insert(key, self.bindings.len());
            self.bindings.push(binding);
        }
        Ok(())
    }

    /// Re-resolve every binding against `devices`.
    ///
    /// When several devices share a bound name, the last one wins. Bindings
    /// left without a match are reported and stay inert.
    pub fn resolve(&mut self, devices: &[Device]) -> Resolution {
        self.by_id.clear();
        for binding in &mut self.bindings {
            binding.id = None;
        }

        for device in devices {
            let Some(&idx) = self.by_name.get(&device.name_key()) else {
                continue;
            };
            if let Some(old) = self.bindings[idx].id.replace(device.id.clone()) {
                self.by_id.remove(&old);
            }
            self.by_id.insert(device.id.clone(), idx);
        }

        let mut resolution = Resolution::default();
        for binding in &self.bindings {
            match &binding.id {
                Some(id) => {
                    tracing::debug!(name = %binding.spec.name, device_id = %id, "binding armed");
                    resolution.armed.push((binding.spec.name.clone(), id.clone()));
                }
                None => {
                    tracing::warn!(
                        name = %binding.spec.name,
                        "binding matches no device, staying inert"
                    );
                    resolution.inert.push(binding.spec.name.clone());
                }
            }
        }
        resolution
    }

    /// Binding armed for `id`, if any.
    #[must_use]
    pub fn route(&self, id: &DeviceId) -> Option<&Binding<T>> {
        self.by_id.get(id).map(|&idx| &self.bindings[idx])
    }

    /// Binding declared under `name`, case-insensitively, armed or not.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Binding<T>> {
        self.by_name.get(&name_key(name)).map(|&idx| &self.bindings[idx])
    }

    /// All declared bindings, in declaration order.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding<T>> {
        self.bindings.iter()
    }

    /// Number of declared bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing has been declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
