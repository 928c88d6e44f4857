//! Instance configuration and the ambient runtime context

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::object::ManagedObject;
use crate::value::Value;

/// Reserved configuration key carrying the instance name.
pub const INSTANCE_NAME_PROPERTY: &str = "instance.name";

/// Reserved configuration key carrying a pre-built object to adopt instead
/// of constructing one.
pub const INSTANCE_OBJECT_PROPERTY: &str = "instance.object";

/// The dictionary-like configuration of a component instance: string keys
/// mapped to arbitrary values.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    entries: FxHashMap<String, Value>,
}

impl Configuration {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an entry, replacing any previous value for the key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.set(key, value);
        self
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up a string entry.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// The reserved instance name, if configured.
    pub fn instance_name(&self) -> Option<&str> {
        self.get_str(INSTANCE_NAME_PROPERTY)
    }

    /// The reserved pre-built object to adopt, if configured.
    pub fn instance_object(&self) -> Option<Arc<ManagedObject>> {
        self.get(INSTANCE_OBJECT_PROPERTY)
            .and_then(Value::as_object)
            .cloned()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the configuration is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ambient context shared by the instances of a component type.
///
/// Holds environment properties. Constructor resolution fills the first
/// unset context-typed parameter with the owning manager's context.
#[derive(Default)]
pub struct RuntimeContext {
    properties: Mutex<FxHashMap<String, Value>>,
}

impl RuntimeContext {
    /// Create an empty runtime context.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Look up a property.
    pub fn property(&self, key: &str) -> Option<Value> {
        self.properties.lock().get(key).cloned()
    }

    /// Set a property.
    pub fn set_property(&self, key: impl Into<String>, value: Value) {
        self.properties.lock().insert(key.into(), value);
    }
}

impl fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext").finish_non_exhaustive()
    }
}
