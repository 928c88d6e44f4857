//! Properties handler
//!
//! Maps configuration entries onto declared fields. During `configure`
//! the handler records every configuration entry whose key names a
//! declared field and registers itself on those fields; reads of a field
//! that has no value yet resolve to the configured property, and writes
//! keep the property in sync. `reconfigure` pushes updated values
//! through the normal write interception path.

use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::debug;

use armature_core::{
    AccessKind, ComponentMetadata, Configuration, ConstructorInterceptor, ContainerResult,
    FieldInterceptor, FieldInvocationContext, Handler, InstanceManager, MethodInterceptor, Value,
    INSTANCE_NAME_PROPERTY, INSTANCE_OBJECT_PROPERTY,
};

/// Handler injecting configuration properties into declared fields.
#[derive(Default)]
pub struct PropertiesHandler {
    manager: OnceCell<Weak<InstanceManager>>,
    properties: Mutex<FxHashMap<String, Value>>,
}

impl PropertiesHandler {
    /// Create a detached properties handler.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The current value of a tracked property.
    pub fn property(&self, name: &str) -> Option<Value> {
        self.properties.lock().get(name).cloned()
    }
}

impl FieldInterceptor for PropertiesHandler {
    fn on_field_access(
        &self,
        context: &mut FieldInvocationContext<'_>,
        value: Value,
    ) -> ContainerResult<()> {
        match context.kind() {
            AccessKind::Read => {
                // An unset field resolves to the configured property.
                let proposed = if value.is_null() {
                    self.properties
                        .lock()
                        .get(&*context.field().name)
                        .cloned()
                        .unwrap_or(value)
                } else {
                    value
                };
                context.proceed(proposed)?;
            }
            AccessKind::Write => {
                let name = context.field().name.clone();
                let resolved = context.proceed(value)?;
                let mut properties = self.properties.lock();
                if properties.contains_key(&*name) {
                    properties.insert(name.to_string(), resolved);
                }
            }
        }
        Ok(())
    }
}

impl MethodInterceptor for PropertiesHandler {}
impl ConstructorInterceptor for PropertiesHandler {}

impl Handler for PropertiesHandler {
    fn name(&self) -> &str {
        "properties"
    }

    fn configure(
        self: Arc<Self>,
        manager: &Arc<InstanceManager>,
        _metadata: &ComponentMetadata,
        configuration: &Configuration,
    ) -> ContainerResult<()> {
        let _ = self.manager.set(Arc::downgrade(manager));

        let class = manager.class()?;
        for (key, value) in configuration.iter() {
            if key == INSTANCE_NAME_PROPERTY || key == INSTANCE_OBJECT_PROPERTY {
                continue;
            }
            if class.field(key).is_some() {
                debug!(instance = %manager.name(), field = %key, "tracking configured property");
                self.properties.lock().insert(key.clone(), value.clone());
                manager.register_field_interceptor(key, self.clone());
            }
        }
        Ok(())
    }

    fn reconfigure(&self, configuration: &Configuration) -> ContainerResult<()> {
        let manager = self.manager.get().and_then(Weak::upgrade);
        let tracked: Vec<String> = self.properties.lock().keys().cloned().collect();
        for key in tracked {
            if let Some(value) = configuration.get(&key) {
                self.properties.lock().insert(key.clone(), value.clone());
                if let Some(manager) = &manager {
                    manager.on_set(None, &key, value.clone())?;
                }
            }
        }
        Ok(())
    }
}
