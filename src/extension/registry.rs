//! Per-document extension registry.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Extension, ExtensionClass, ExtensionType};

struct Registered {
    class: ExtensionClass,
    extension: Rc<dyn Extension>,
    instance: Rc<dyn Any>,
    required: bool,
}

/// Extensions registered on one document, in registration order, plus
/// dependencies injected for their hooks (decoders and the like).
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: Vec<Registered>,
    dependencies: HashMap<String, Rc<dyn Any>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the singleton of `E`, creating it on first use.
    pub fn get_or_insert<E: ExtensionType>(&mut self) -> Rc<E> {
        if let Some(existing) = self.get_typed::<E>() {
            return existing;
        }
        let instance = Rc::new(E::create());
        self.entries.push(Registered {
            class: ExtensionClass::of::<E>(),
            extension: instance.clone(),
            instance: instance.clone(),
            required: false,
        });
        instance
    }

    /// Typed access to a registered extension.
    pub fn get_typed<E: ExtensionType>(&self) -> Option<Rc<E>> {
        self.entries
            .iter()
            .find(|e| e.class.name() == E::NAME)
            .and_then(|e| e.instance.clone().downcast::<E>().ok())
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Extension>> {
        self.entries
            .iter()
            .find(|e| e.class.name() == name)
            .map(|e| e.extension.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.class.name() == name)
    }

    /// Registered extensions, in registration order.
    pub fn list(&self) -> Vec<Rc<dyn Extension>> {
        self.entries.iter().map(|e| e.extension.clone()).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.class.name()).collect()
    }

    pub(crate) fn classes(&self) -> Vec<(ExtensionClass, bool)> {
        self.entries.iter().map(|e| (e.class, e.required)).collect()
    }

    /// Mark an extension as required for loading. Returns false when it
    /// is not registered.
    pub fn set_required(&mut self, name: &str, required: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.class.name() == name) {
            Some(entry) => {
                entry.required = required;
                true
            }
            None => false,
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.class.name() == name && e.required)
    }

    /// Unregister an extension. Its properties are not touched here.
    pub(crate) fn remove(&mut self, name: &str) -> Option<Rc<dyn Extension>> {
        let index = self.entries.iter().position(|e| e.class.name() == name)?;
        Some(self.entries.remove(index).extension)
    }

    /// Make `value` available to extension hooks under `key`.
    pub fn register_dependency(&mut self, key: impl Into<String>, value: Rc<dyn Any>) {
        self.dependencies.insert(key.into(), value);
    }

    pub fn dependency<T: Any>(&self, key: &str) -> Option<Rc<T>> {
        self.dependencies.get(key)?.clone().downcast::<T>().ok()
    }

    pub fn has_dependency(&self, key: &str) -> bool {
        self.dependencies.contains_key(key)
    }

    pub(crate) fn dependencies(&self) -> impl Iterator<Item = (&String, &Rc<dyn Any>)> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
