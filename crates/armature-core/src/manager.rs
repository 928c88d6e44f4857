//! Instance manager
//!
//! The per-instance container. It owns the managed object(s), the three
//! interceptor registries and the lifecycle state machine, and exposes
//! the dispatch entry points invoked by managed code on every intercepted
//! field access, method call and construction.
//!
//! All operations run synchronously on the caller's thread. Shared state
//! is protected by per-structure locks; the state-transition critical
//! section has its own lock plus a FIFO queue so reentrant transitions
//! are applied after the in-flight one completes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{error, info};

use crate::class::{ClassDescriptor, FieldDescriptor};
use crate::config::{Configuration, RuntimeContext};
use crate::description::{HandlerDescription, InstanceDescription};
use crate::error::{ContainerError, ContainerResult};
use crate::factory::{ComponentFactory, ComponentMetadata};
use crate::handler::Handler;
use crate::interceptor::{ConstructorInterceptor, FieldInterceptor, MethodInterceptor};
use crate::invocation::{
    AccessKind, ConstructorInvocationContext, FieldInvocationContext, MethodInvocationContext,
};
use crate::lifecycle::{InstanceState, InstanceStateListener};
use crate::object::ManagedObject;
use crate::registry::{GlobalRegistry, KeyedRegistry, CORE_PRIORITY, DEFAULT_PRIORITY};
use crate::value::Value;

/// Metadata frozen at configuration time.
struct ConfiguredMeta {
    name: Arc<str>,
    class_name: Arc<str>,
    factory_method: Option<Arc<str>>,
}

/// State-machine storage behind the lifecycle lock.
struct LifecycleInner {
    state: InstanceState,
    in_transition: bool,
    queue: VecDeque<InstanceState>,
}

/// The container of one component instance.
///
/// Created by a [`ComponentFactory`]; `configure` then `start` bring it
/// up, `stop`/`dispose` tear it down. Not clonable; shared through `Arc`.
pub struct InstanceManager {
    self_ref: Weak<InstanceManager>,
    factory: Arc<ComponentFactory>,
    context: Arc<RuntimeContext>,
    handlers: Vec<Arc<dyn Handler>>,
    configured: OnceCell<ConfiguredMeta>,
    /// Lazily loaded; released on dispose.
    class_slot: Mutex<Option<Arc<ClassDescriptor>>>,
    lifecycle: Mutex<LifecycleInner>,
    listeners: Mutex<Vec<Arc<dyn InstanceStateListener>>>,
    objects: Mutex<Vec<Arc<ManagedObject>>>,
    /// Managed field values held by the container.
    fields: Mutex<FxHashMap<String, Value>>,
    field_registry: KeyedRegistry<dyn FieldInterceptor>,
    method_registry: KeyedRegistry<dyn MethodInterceptor>,
    constructor_registry: GlobalRegistry<dyn ConstructorInterceptor>,
}

impl InstanceManager {
    pub(crate) fn new(
        factory: Arc<ComponentFactory>,
        context: Arc<RuntimeContext>,
        handlers: Vec<Arc<dyn Handler>>,
        self_ref: Weak<InstanceManager>,
    ) -> Self {
        Self {
            self_ref,
            factory,
            context,
            handlers,
            configured: OnceCell::new(),
            class_slot: Mutex::new(None),
            lifecycle: Mutex::new(LifecycleInner {
                state: InstanceState::Stopped,
                in_transition: false,
                queue: VecDeque::new(),
            }),
            listeners: Mutex::new(Vec::new()),
            objects: Mutex::new(Vec::new()),
            fields: Mutex::new(FxHashMap::default()),
            field_registry: KeyedRegistry::new(),
            method_registry: KeyedRegistry::new(),
            constructor_registry: GlobalRegistry::new(),
        }
    }

    // ----- identity & collaborators -------------------------------------

    /// The instance name.
    pub fn name(&self) -> &str {
        self.configured
            .get()
            .map(|m| &*m.name)
            .unwrap_or("<unconfigured>")
    }

    /// The implementation class name, once configured.
    pub fn class_name(&self) -> Option<&str> {
        self.configured.get().map(|m| &*m.class_name)
    }

    /// The ambient runtime context of the instance.
    pub fn context(&self) -> &Arc<RuntimeContext> {
        &self.context
    }

    /// The factory which created this instance.
    pub fn factory(&self) -> &Arc<ComponentFactory> {
        &self.factory
    }

    /// The attached handlers, in attachment order.
    pub fn handlers(&self) -> &[Arc<dyn Handler>] {
        &self.handlers
    }

    /// Look up an attached handler by name, for cross-handler
    /// interactions.
    pub fn handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.iter().find(|h| h.name() == name).cloned()
    }

    /// The implementation class, loading it on first use.
    ///
    /// A resolution failure stops the instance: nothing can be dispatched
    /// without the class.
    pub fn class(&self) -> ContainerResult<Arc<ClassDescriptor>> {
        let mut slot = self.class_slot.lock();
        if let Some(class) = slot.as_ref() {
            return Ok(class.clone());
        }
        let meta = self.configured_meta()?;
        let class_name = meta.class_name.clone();
        match self.factory.load_class(&class_name) {
            Some(class) => {
                *slot = Some(class.clone());
                Ok(class)
            }
            None => {
                drop(slot);
                error!(instance = %self.name(), class = %class_name, "class not found during loading");
                self.stop();
                Err(ContainerError::ClassNotFound(class_name.to_string()))
            }
        }
    }

    fn configured_meta(&self) -> ContainerResult<&ConfiguredMeta> {
        self.configured
            .get()
            .ok_or_else(|| ContainerError::IllegalState("instance is not configured".into()))
    }

    /// The owning `Arc` of this manager, handed to handlers and injected
    /// into constructor chains.
    fn shared(&self) -> ContainerResult<Arc<InstanceManager>> {
        self.self_ref
            .upgrade()
            .ok_or_else(|| ContainerError::IllegalState("instance manager is being torn down".into()))
    }

    // ----- configuration -------------------------------------------------

    /// Configure the instance: record the name, the factory-method name
    /// and an adopted object if the configuration carries one, then
    /// configure the handlers in attachment order and register each of
    /// them on the constructor chain at [`CORE_PRIORITY`].
    pub fn configure(
        &self,
        metadata: &ComponentMetadata,
        configuration: &Configuration,
    ) -> ContainerResult<()> {
        let name: Arc<str> = configuration
            .instance_name()
            .map(Arc::from)
            .ok_or_else(|| ContainerError::Configuration("missing instance.name".into()))?;
        let meta = ConfiguredMeta {
            name,
            class_name: Arc::from(metadata.class_name.as_str()),
            factory_method: metadata.factory_method.as_deref().map(Arc::from),
        };
        self.configured
            .set(meta)
            .map_err(|_| ContainerError::IllegalState("instance already configured".into()))?;

        if let Some(object) = configuration.instance_object() {
            self.objects.lock().push(object);
        }

        let this = self.shared()?;
        for handler in &self.handlers {
            handler.clone().configure(&this, metadata, configuration)?;
            let interceptor: Arc<dyn ConstructorInterceptor> = handler.clone();
            self.constructor_registry.register(CORE_PRIORITY, interceptor);
        }
        Ok(())
    }

    /// Push a new configuration into the handlers and recompute the
    /// instance state. A stopped instance is restarted; an invalid one is
    /// revalidated when every handler is valid again.
    pub fn reconfigure(&self, configuration: &Configuration) {
        info!(instance = %self.name(), "reconfiguring instance");
        for handler in &self.handlers {
            if let Err(error) = handler.reconfigure(configuration) {
                error!(
                    instance = %self.name(),
                    handler = handler.name(),
                    %error,
                    "handler failed to reconfigure"
                );
            }
        }
        match self.state() {
            InstanceState::Stopped => {
                info!(instance = %self.name(), "instance stopped during reconfiguration, restarting");
                if let Err(error) = self.start() {
                    error!(instance = %self.name(), %error, "restart after reconfiguration failed");
                }
            }
            InstanceState::Invalid => {
                info!(instance = %self.name(), "instance invalid during reconfiguration, recomputing state");
                if self.handlers.iter().all(|h| h.is_valid()) {
                    self.set_state(InstanceState::Valid);
                }
            }
            _ => {}
        }
    }

    // ----- lifecycle ------------------------------------------------------

    /// The current lifecycle state.
    pub fn state(&self) -> InstanceState {
        self.lifecycle.lock().state
    }

    /// Whether the instance is started (`Valid` or `Invalid`).
    pub fn is_started(&self) -> bool {
        self.state().is_started()
    }

    /// Start the instance: activate the handlers in attachment order,
    /// wire an adopted object if one was configured, then compute the
    /// initial state as the AND of handler validities.
    ///
    /// A no-op unless the instance is `Stopped`; the transitional
    /// `Starting` state guards against reentrant starts.
    pub fn start(&self) -> ContainerResult<()> {
        {
            let mut life = self.lifecycle.lock();
            if life.state != InstanceState::Stopped {
                return Ok(());
            }
            life.state = InstanceState::Starting;
        }

        for handler in &self.handlers {
            if let Err(error) = handler.start() {
                error!(
                    instance = %self.name(),
                    handler = handler.name(),
                    %error,
                    "handler failed to start"
                );
                self.stop();
                return Err(error);
            }
        }

        let adopted = self.objects.lock().first().cloned();
        if let Some(object) = adopted {
            self.wire_adopted_object(object)?;
        }

        if self.handlers.iter().all(|h| h.is_valid()) {
            self.set_state(InstanceState::Valid);
        } else {
            self.set_state(InstanceState::Invalid);
        }
        Ok(())
    }

    /// Stop the instance: clear any queued transitions, pass through
    /// `Invalid`, stop the handlers in reverse order, drop the managed
    /// objects and un-inject non-primitive field values.
    pub fn stop(&self) {
        {
            let mut life = self.lifecycle.lock();
            if life.state == InstanceState::Stopped {
                return;
            }
            life.queue.clear();
            life.in_transition = false;
        }

        // Must run outside the lifecycle lock.
        self.set_state(InstanceState::Invalid);

        for handler in self.handlers.iter().rev() {
            handler.stop();
        }

        let listeners = {
            let mut life = self.lifecycle.lock();
            life.state = InstanceState::Stopped;
            self.listeners.lock().clone()
        };
        self.objects.lock().clear();

        for listener in &listeners {
            listener.state_changed(self, InstanceState::Stopped);
        }

        // Un-inject the values previously pushed into the field storage.
        let class = self.class_slot.lock().clone();
        if let Some(class) = class {
            let names: Vec<String> = self.fields.lock().keys().cloned().collect();
            for name in names {
                if let Some(field) = class.field(&name) {
                    if !field.ty.is_primitive() {
                        self.do_set_field(None, field, Value::Null);
                    }
                }
            }
        }
    }

    /// Dispose the instance: stop it if started, notify listeners of the
    /// terminal state, dispose the handlers in reverse order and release
    /// the class reference.
    ///
    /// The interceptor registries are deliberately kept, so late
    /// callbacks from in-flight dispatches still resolve consistently.
    /// Disposing twice is a no-op.
    pub fn dispose(&self) {
        let (listeners, started) = {
            let life = self.lifecycle.lock();
            if life.state == InstanceState::Disposed {
                return;
            }
            let mut listeners = self.listeners.lock();
            let drained: Vec<_> = listeners.drain(..).collect();
            (drained, life.state.is_started())
        };

        if started {
            self.stop();
        }

        self.lifecycle.lock().state = InstanceState::Disposed;

        for listener in &listeners {
            listener.state_changed(self, InstanceState::Disposed);
        }

        for handler in self.handlers.iter().rev() {
            handler.dispose();
        }

        self.factory.instance_disposed(self);
        *self.class_slot.lock() = None;
    }

    /// Apply a new lifecycle state.
    ///
    /// Reentrant-safe: when a transition is already in progress the new
    /// target is queued and applied after the in-flight one completes.
    /// Handlers are notified in attachment order when the state
    /// increases and in reverse order when it decreases; a handler
    /// rejecting the transition forces an immediate stop.
    pub fn set_state(&self, new_state: InstanceState) {
        let mut transitioned = false;
        let mut original = InstanceState::Stopped;
        let mut listeners: Vec<Arc<dyn InstanceStateListener>> = Vec::new();
        {
            let mut life = self.lifecycle.lock();
            if life.in_transition {
                life.queue.push_back(new_state);
                return;
            }
            if life.state != new_state {
                life.in_transition = true;
                original = life.state;
                life.state = new_state;
                listeners = self.listeners.lock().clone();
                transitioned = true;
            }
        }

        if transitioned {
            let result = if new_state > original {
                self.handlers
                    .iter()
                    .try_for_each(|h| h.state_changed(new_state))
            } else {
                self.handlers
                    .iter()
                    .rev()
                    .try_for_each(|h| h.state_changed(new_state))
            };
            if let Err(error) = result {
                // The instance must not stay half-transitioned.
                self.stop();
                error!(instance = %self.name(), %error, "handler rejected state transition");
                return;
            }

            for listener in &listeners {
                listener.state_changed(self, new_state);
            }
        }

        let next = {
            let mut life = self.lifecycle.lock();
            life.in_transition = false;
            life.queue.pop_front()
        };
        if let Some(state) = next {
            self.set_state(state);
        }
    }

    /// Callback for a handler whose validity changed. Recomputes the
    /// instance state; ignored unless the instance is started.
    pub fn handler_state_changed(&self, new_state: InstanceState) {
        let state = {
            let life = self.lifecycle.lock();
            if !life.state.is_started() {
                return;
            }
            life.state
        };

        if new_state == InstanceState::Invalid && state == InstanceState::Valid {
            self.set_state(InstanceState::Invalid);
        } else if new_state == InstanceState::Valid && state == InstanceState::Invalid {
            if self.handlers.iter().all(|h| h.is_valid()) {
                self.set_state(InstanceState::Valid);
            }
        }
    }

    /// Register an instance state listener.
    pub fn add_instance_state_listener(&self, listener: Arc<dyn InstanceStateListener>) {
        self.listeners.lock().push(listener);
    }

    /// Unregister an instance state listener.
    pub fn remove_instance_state_listener(&self, listener: &Arc<dyn InstanceStateListener>) {
        self.listeners.lock().retain(|l| !Arc::ptr_eq(l, listener));
    }

    // ----- interceptor registration --------------------------------------

    /// Register a field interceptor at [`DEFAULT_PRIORITY`].
    pub fn register_field_interceptor(&self, field: &str, interceptor: Arc<dyn FieldInterceptor>) {
        self.field_registry.register(DEFAULT_PRIORITY, field, interceptor);
    }

    /// Register a field interceptor at the given priority.
    pub fn register_field_interceptor_with_priority(
        &self,
        priority: i32,
        field: &str,
        interceptor: Arc<dyn FieldInterceptor>,
    ) {
        self.field_registry.register(priority, field, interceptor);
    }

    /// Register a method interceptor at [`DEFAULT_PRIORITY`].
    pub fn register_method_interceptor(
        &self,
        method: &str,
        interceptor: Arc<dyn MethodInterceptor>,
    ) {
        self.method_registry.register(DEFAULT_PRIORITY, method, interceptor);
    }

    /// Register a method interceptor at the given priority.
    pub fn register_method_interceptor_with_priority(
        &self,
        priority: i32,
        method: &str,
        interceptor: Arc<dyn MethodInterceptor>,
    ) {
        self.method_registry.register(priority, method, interceptor);
    }

    /// Register a constructor interceptor at [`DEFAULT_PRIORITY`].
    pub fn register_constructor_interceptor(&self, interceptor: Arc<dyn ConstructorInterceptor>) {
        self.constructor_registry.register(DEFAULT_PRIORITY, interceptor);
    }

    /// Register a constructor interceptor at the given priority.
    pub fn register_constructor_interceptor_with_priority(
        &self,
        priority: i32,
        interceptor: Arc<dyn ConstructorInterceptor>,
    ) {
        self.constructor_registry.register(priority, interceptor);
    }

    /// Fields with at least one registered interceptor.
    pub fn registered_fields(&self) -> Vec<String> {
        self.field_registry.keys()
    }

    /// Methods with at least one registered interceptor.
    pub fn registered_methods(&self) -> Vec<String> {
        self.method_registry.keys()
    }

    // ----- dispatch entry points -----------------------------------------

    /// Field-read entry point, called by managed code on every read of an
    /// intercepted field.
    ///
    /// Runs a read traversal to resolve the value; if the resolved value
    /// differs by identity from the stored one, one extra write-kind
    /// traversal of the same chain snapshot notifies the interceptors of
    /// the new value.
    pub fn on_get(
        &self,
        target: Option<&Arc<ManagedObject>>,
        field_name: &str,
    ) -> ContainerResult<Value> {
        let initial = self
            .fields
            .lock()
            .get(field_name)
            .cloned()
            .unwrap_or_default();

        let class = self.class()?;
        let field = self.lookup_field(&class, field_name)?;
        let chain = self.field_registry.snapshot(field_name);

        let mut context =
            FieldInvocationContext::new(self, chain.clone(), target, AccessKind::Read, field);
        let result = match context.proceed(initial.clone()) {
            Ok(value) => value,
            Err(cause) => return Err(self.fail_field_chain(field_name, cause)),
        };

        if !initial.same_identity(&result) {
            // The chain snapshot is exactly the same.
            let mut notify =
                FieldInvocationContext::new(self, chain, target, AccessKind::Write, field);
            if let Err(cause) = notify.proceed(result.clone()) {
                return Err(self.fail_field_chain(field_name, cause));
            }
        }
        Ok(result)
    }

    /// Field-write entry point, called by managed code on every write of
    /// an intercepted field. `target` is absent when the change comes
    /// from a handler.
    pub fn on_set(
        &self,
        target: Option<&Arc<ManagedObject>>,
        field_name: &str,
        value: Value,
    ) -> ContainerResult<()> {
        let class = self.class()?;
        let field = self.lookup_field(&class, field_name)?;
        let chain = self.field_registry.snapshot(field_name);

        let mut context = FieldInvocationContext::new(self, chain, target, AccessKind::Write, field);
        match context.proceed(value) {
            Ok(_) => Ok(()),
            Err(cause) => Err(self.fail_field_chain(field_name, cause)),
        }
    }

    /// Method-call entry point, called by managed code on every
    /// invocation of an intercepted method.
    ///
    /// Errors raised by the method body pass through unchanged; protocol
    /// violations stop the instance.
    pub fn on_method(
        &self,
        target: Option<&Arc<ManagedObject>>,
        method_id: &str,
        args: Vec<Value>,
    ) -> ContainerResult<Value> {
        let class = self.class()?;
        let Some(method) = class.method(method_id) else {
            info!(
                instance = %self.name(),
                method = method_id,
                "method id cannot be associated with a managed method"
            );
            return Err(ContainerError::NoSuchMethod {
                class: class.name().to_string(),
                method: method_id.to_string(),
            });
        };
        if args.len() != method.param_types.len() {
            return Err(ContainerError::TypeMismatch {
                member: method_id.to_string(),
                expected: format!("{} parameter(s)", method.param_types.len()),
                found: format!("{} argument(s)", args.len()),
            });
        }

        let chain = self.method_registry.snapshot(method_id);
        let mut context = MethodInvocationContext::new(chain, target, method, args);
        match context.proceed() {
            Ok(value) => Ok(value),
            Err(cause) if cause.is_protocol_violation() => {
                error!(
                    instance = %self.name(),
                    method = method_id,
                    error = %cause,
                    "method interception chain failed"
                );
                self.stop();
                Err(ContainerError::ChainFailed {
                    member: method_id.to_string(),
                    source: Box::new(cause),
                })
            }
            Err(cause) => Err(cause),
        }
    }

    /// Tail operation of the field chain: store the value and propagate
    /// it into the live objects. When `target` is given only that object
    /// is written, otherwise every live object is.
    pub(crate) fn do_set_field(
        &self,
        target: Option<&Arc<ManagedObject>>,
        field: &FieldDescriptor,
        value: Value,
    ) {
        self.fields
            .lock()
            .insert(field.name.to_string(), value.clone());

        match target {
            Some(object) => object.store_field(field, value),
            None => {
                let objects = self.objects.lock().clone();
                for object in &objects {
                    object.store_field(field, value.clone());
                }
            }
        }
    }

    /// The value of a managed field: the container store first, falling
    /// back to the first live object's storage.
    pub fn field_value(&self, field_name: &str) -> Option<Value> {
        let stored = self.fields.lock().get(field_name).cloned();
        match stored {
            Some(value) if !value.is_null() => Some(value),
            _ => {
                let first = self.objects.lock().first().cloned();
                first.and_then(|o| o.field_by_name(field_name))
            }
        }
    }

    fn lookup_field<'c>(
        &self,
        class: &'c Arc<ClassDescriptor>,
        field_name: &str,
    ) -> ContainerResult<&'c FieldDescriptor> {
        class.field(field_name).ok_or_else(|| {
            error!(instance = %self.name(), field = field_name, "cannot find managed field");
            ContainerError::NoSuchField {
                class: class.name().to_string(),
                field: field_name.to_string(),
            }
        })
    }

    /// A failed field chain leaves the instance state model untrustworthy:
    /// log, stop, and wrap the cause.
    fn fail_field_chain(&self, field_name: &str, cause: ContainerError) -> ContainerError {
        error!(
            instance = %self.name(),
            field = field_name,
            error = %cause,
            "field interception chain failed"
        );
        self.stop();
        ContainerError::ChainFailed {
            member: field_name.to_string(),
            source: Box::new(cause),
        }
    }

    // ----- managed object lifecycle --------------------------------------

    /// Create a managed object through the constructor interception
    /// chain and add it to the live object list.
    pub fn create_managed_object(&self) -> ContainerResult<Arc<ManagedObject>> {
        let object = self.create_object()?;
        self.objects.lock().push(object.clone());
        Ok(object)
    }

    /// The singleton managed object, created lazily.
    ///
    /// The object is created outside the object-list lock: two racing
    /// callers may both construct, and the loser's object is discarded.
    pub fn managed_object(&self) -> ContainerResult<Arc<ManagedObject>> {
        if let Some(object) = self.objects.lock().first().cloned() {
            return Ok(object);
        }
        let object = self.create_object()?;
        let mut objects = self.objects.lock();
        if let Some(existing) = objects.first().cloned() {
            return Ok(existing);
        }
        objects.push(object.clone());
        Ok(object)
    }

    /// Remove a managed object from the live object list.
    pub fn delete_managed_object(&self, object: &Arc<ManagedObject>) {
        self.objects.lock().retain(|o| !Arc::ptr_eq(o, object));
    }

    /// The live managed objects.
    pub fn managed_objects(&self) -> Vec<Arc<ManagedObject>> {
        self.objects.lock().clone()
    }

    /// Build one managed object by driving the constructor chain.
    fn create_object(&self) -> ContainerResult<Arc<ManagedObject>> {
        let factory_method = self.configured_meta()?.factory_method.clone();
        let chain = self.constructor_registry.snapshot();
        let this = self.shared()?;

        let mut context = match factory_method {
            Some(name) => ConstructorInvocationContext::new_factory(&this, chain, name),
            None => ConstructorInvocationContext::new_construct(&this, chain),
        };

        match context.proceed() {
            Ok(object) => Ok(object),
            Err(cause) => {
                error!(
                    instance = %self.name(),
                    error = %cause,
                    "managed object construction failed"
                );
                self.stop();
                Err(ContainerError::CreationFailed {
                    instance: self.name().to_string(),
                    source: Box::new(cause),
                })
            }
        }
    }

    /// Wire an adopted object to this container and notify the
    /// constructor chain, even though no constructor runs.
    fn wire_adopted_object(&self, object: Arc<ManagedObject>) -> ContainerResult<()> {
        let class = self.class()?;
        if !object.is_instance_of(class.name()) {
            let cause = ContainerError::AdoptedObjectMismatch {
                expected: class.name().to_string(),
                found: object.class().name().to_string(),
            };
            error!(instance = %self.name(), error = %cause, "cannot adopt configured object");
            self.stop();
            return Err(cause);
        }

        let Some(bootstrap) = object.class().find_bootstrap() else {
            error!(
                instance = %self.name(),
                class = %object.class().name(),
                "cannot attach the adopted object to the container"
            );
            self.stop();
            return Err(ContainerError::MissingBootstrap(
                object.class().name().to_string(),
            ));
        };
        let this = self.shared()?;
        bootstrap(&object, &this)?;

        let chain = self.constructor_registry.snapshot();
        let mut context = ConstructorInvocationContext::new_adopt(&this, chain, object);
        if let Err(error) = context.proceed() {
            error!(instance = %self.name(), %error, "error in constructor interception chain");
        }
        Ok(())
    }

    // ----- introspection --------------------------------------------------

    /// Point-in-time description of the instance.
    pub fn instance_description(&self) -> InstanceDescription {
        InstanceDescription {
            name: self.name().to_string(),
            class_name: self.class_name().unwrap_or_default().to_string(),
            state: self.state(),
            handlers: self
                .handlers
                .iter()
                .map(|h| HandlerDescription {
                    name: h.name().to_string(),
                    valid: h.is_valid(),
                })
                .collect(),
            managed_objects: self.objects.lock().len(),
            registered_fields: self.registered_fields(),
            registered_methods: self.registered_methods(),
        }
    }
}

impl fmt::Debug for InstanceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Must not take locks: Debug may run while one is held.
        f.debug_struct("InstanceManager")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
