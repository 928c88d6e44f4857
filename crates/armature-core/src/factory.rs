//! Component factory

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::class::ClassDescriptor;
use crate::config::{Configuration, RuntimeContext, INSTANCE_NAME_PROPERTY};
use crate::error::{ContainerError, ContainerResult};
use crate::handler::Handler;
use crate::manager::InstanceManager;
use crate::registry::ClassRegistry;
use crate::value::Value;

/// The component-type metadata consumed by the factory.
#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    /// The implementation class name, resolved through the class
    /// registry.
    pub class_name: String,
    /// The static factory method used to create objects instead of a
    /// constructor, if any.
    pub factory_method: Option<String>,
}

impl ComponentMetadata {
    /// Metadata for a class constructed through its declared
    /// constructors.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            factory_method: None,
        }
    }

    /// Use a static factory method instead of a constructor.
    pub fn with_factory_method(mut self, name: impl Into<String>) -> Self {
        self.factory_method = Some(name.into());
        self
    }
}

/// Builds a fresh handler set for each created instance.
pub type HandlerProvider = Arc<dyn Fn() -> Arc<dyn Handler> + Send + Sync>;

/// Factory creating instance managers for one component type.
///
/// Holds the component metadata, the class registry used for lazy class
/// loading, the ambient runtime context handed to every instance, and
/// the ordered list of handler providers. Generates instance names when
/// the configuration carries none, and tracks live instances.
pub struct ComponentFactory {
    self_ref: Weak<ComponentFactory>,
    metadata: ComponentMetadata,
    classes: Arc<ClassRegistry>,
    context: Arc<RuntimeContext>,
    handler_providers: Vec<HandlerProvider>,
    instances: Mutex<Vec<Weak<InstanceManager>>>,
    name_counter: AtomicU64,
}

impl ComponentFactory {
    /// Create a factory with no handlers.
    pub fn new(
        metadata: ComponentMetadata,
        classes: Arc<ClassRegistry>,
        context: Arc<RuntimeContext>,
    ) -> Self {
        Self {
            self_ref: Weak::new(),
            metadata,
            classes,
            context,
            handler_providers: Vec::new(),
            instances: Mutex::new(Vec::new()),
            name_counter: AtomicU64::new(0),
        }
    }

    /// Finalize the factory into its shared form. Instances can only be
    /// created from a built factory.
    pub fn build(self) -> Arc<Self> {
        let mut factory = self;
        Arc::new_cyclic(|weak| {
            factory.self_ref = weak.clone();
            factory
        })
    }

    /// Append a handler provider. Handler order is the attachment order
    /// on every created instance.
    pub fn with_handler(
        mut self,
        provider: impl Fn() -> Arc<dyn Handler> + Send + Sync + 'static,
    ) -> Self {
        self.handler_providers.push(Arc::new(provider));
        self
    }

    /// The component metadata.
    pub fn metadata(&self) -> &ComponentMetadata {
        &self.metadata
    }

    /// The ambient runtime context handed to created instances.
    pub fn context(&self) -> &Arc<RuntimeContext> {
        &self.context
    }

    /// Resolve a class descriptor by name.
    pub fn load_class(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Create and configure a new instance.
    ///
    /// When the configuration has no `instance.name`, a
    /// `<class>-<counter>` name is generated. The instance is configured
    /// but not started.
    pub fn create_instance(
        &self,
        configuration: &Configuration,
    ) -> ContainerResult<Arc<InstanceManager>> {
        let this = self.self_ref.upgrade().ok_or_else(|| {
            ContainerError::IllegalState("factory must be built before creating instances".into())
        })?;
        let mut configuration = configuration.clone();
        if configuration.instance_name().is_none() {
            let counter = self.name_counter.fetch_add(1, Ordering::Relaxed);
            configuration.set(
                INSTANCE_NAME_PROPERTY,
                Value::str(format!("{}-{}", self.metadata.class_name, counter)),
            );
        }

        let handlers: Vec<Arc<dyn Handler>> =
            self.handler_providers.iter().map(|provider| provider()).collect();
        let manager = Arc::new_cyclic(|weak| {
            InstanceManager::new(this.clone(), self.context.clone(), handlers, weak.clone())
        });
        manager.configure(&self.metadata, &configuration)?;

        self.instances.lock().push(Arc::downgrade(&manager));
        Ok(manager)
    }

    /// The live instances created by this factory.
    pub fn instances(&self) -> Vec<Arc<InstanceManager>> {
        self.instances
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Forget a disposed instance.
    pub(crate) fn instance_disposed(&self, manager: &InstanceManager) {
        self.instances.lock().retain(|weak| {
            weak.upgrade()
                .map(|m| !std::ptr::eq(Arc::as_ptr(&m), manager))
                .unwrap_or(false)
        });
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("class_name", &self.metadata.class_name)
            .field("handlers", &self.handler_providers.len())
            .finish_non_exhaustive()
    }
}
