//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use armature_core::{
    ClassDescriptor, ClassRegistry, ComponentFactory, ComponentMetadata, Configuration,
    ConstructorInterceptor, ConstructorInvocationContext, ContainerError, ContainerResult,
    FieldInterceptor, FieldInvocationContext, Handler, InstanceManager, InstanceState,
    InstanceStateListener, MethodInterceptor, MethodInvocationContext, RuntimeContext, Value,
    ValueType,
};

/// Shared event log, used to observe dispatch and lifecycle ordering.
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

/// The standard test class: two int fields, a string field, and a few
/// methods exercising the dispatch entry points the way managed code
/// does.
pub fn point_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder("Point")
        .field("x", ValueType::Int)
        .field("y", ValueType::Int)
        .field("name", ValueType::Str)
        .constructor(vec![ValueType::Manager], |class, params| {
            let manager = expect_manager(params)?;
            let object = armature_core::ManagedObject::new(class);
            manager.on_set(Some(&object), "x", Value::Int(0))?;
            manager.on_set(Some(&object), "y", Value::Int(0))?;
            Ok(object)
        })
        .method("sum", vec![], |target, _args| {
            let (object, manager) = expect_target(target)?;
            let x = manager.on_get(Some(object), "x")?.as_int().unwrap_or(0);
            let y = manager.on_get(Some(object), "y")?.as_int().unwrap_or(0);
            Ok(Value::Int(x + y))
        })
        .method("scale", vec![ValueType::Int], |target, args| {
            let (object, manager) = expect_target(target)?;
            let factor = args[0].as_int().unwrap_or(1);
            let x = manager.on_get(Some(object), "x")?.as_int().unwrap_or(0);
            manager.on_set(Some(object), "x", Value::Int(x * factor))?;
            Ok(Value::Null)
        })
        .method("fail", vec![], |_target, _args| {
            Err(ContainerError::Target("boom".into()))
        })
        .default_bootstrap()
        .build()
}

fn expect_manager(params: &[Value]) -> ContainerResult<Arc<InstanceManager>> {
    params
        .first()
        .and_then(Value::as_manager)
        .cloned()
        .ok_or_else(|| ContainerError::IllegalState("missing manager parameter".into()))
}

fn expect_target<'a>(
    target: Option<&'a Arc<armature_core::ManagedObject>>,
) -> ContainerResult<(&'a Arc<armature_core::ManagedObject>, Arc<InstanceManager>)> {
    let object = target.ok_or_else(|| ContainerError::IllegalState("missing target".into()))?;
    let manager = object
        .manager()
        .ok_or_else(|| ContainerError::IllegalState("object is detached".into()))?;
    Ok((object, manager))
}

/// Build a started instance of [`point_class`] with no handlers.
pub fn point_instance() -> Arc<InstanceManager> {
    let classes = ClassRegistry::new();
    classes.register(point_class());
    let factory = ComponentFactory::new(
        ComponentMetadata::new("Point"),
        classes,
        RuntimeContext::new(),
    )
    .build();
    let manager = factory
        .create_instance(&Configuration::new())
        .expect("configured");
    manager.start().expect("started");
    manager
}

/// Interceptor recording its label on dispatch, then proceeding.
pub struct Recorder {
    pub label: &'static str,
    pub log: Log,
}

impl Recorder {
    pub fn new(label: &'static str, log: &Log) -> Arc<Self> {
        Arc::new(Self {
            label,
            log: log.clone(),
        })
    }
}

impl FieldInterceptor for Recorder {
    fn on_field_access(
        &self,
        context: &mut FieldInvocationContext<'_>,
        value: Value,
    ) -> ContainerResult<()> {
        self.log.lock().push(self.label.to_string());
        context.proceed(value)?;
        Ok(())
    }
}

impl MethodInterceptor for Recorder {
    fn on_method_call(&self, context: &mut MethodInvocationContext<'_>) -> ContainerResult<Value> {
        self.log.lock().push(self.label.to_string());
        context.proceed()
    }
}

impl ConstructorInterceptor for Recorder {
    fn on_constructor_call(
        &self,
        context: &mut ConstructorInvocationContext<'_>,
    ) -> ContainerResult<()> {
        self.log.lock().push(self.label.to_string());
        context.proceed()?;
        Ok(())
    }
}

/// Listener recording every state notification.
pub struct StateRecorder {
    pub log: Log,
}

impl StateRecorder {
    pub fn new(log: &Log) -> Arc<Self> {
        Arc::new(Self { log: log.clone() })
    }
}

impl InstanceStateListener for StateRecorder {
    fn state_changed(&self, _manager: &InstanceManager, state: InstanceState) {
        self.log.lock().push(format!("{:?}", state));
    }
}

/// A scriptable handler for lifecycle tests.
pub struct TestHandler {
    name: &'static str,
    valid: AtomicBool,
    fail_start: AtomicBool,
    reject_state: Mutex<Option<InstanceState>>,
    pub events: Log,
    manager: OnceCell<Weak<InstanceManager>>,
}

impl TestHandler {
    pub fn new(name: &'static str, events: &Log) -> Arc<Self> {
        Arc::new(Self {
            name,
            valid: AtomicBool::new(true),
            fail_start: AtomicBool::new(false),
            reject_state: Mutex::new(None),
            events: events.clone(),
            manager: OnceCell::new(),
        })
    }

    /// Make `start()` fail with an illegal-state error.
    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    /// Start out invalid.
    pub fn invalid(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }

    /// Reject transitions into the given state.
    pub fn reject(&self, state: InstanceState) {
        *self.reject_state.lock() = Some(state);
    }

    /// Flip validity at runtime and notify the manager.
    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
        if let Some(manager) = self.manager.get().and_then(Weak::upgrade) {
            let state = if valid {
                InstanceState::Valid
            } else {
                InstanceState::Invalid
            };
            manager.handler_state_changed(state);
        }
    }

    pub fn manager(&self) -> Option<Arc<InstanceManager>> {
        self.manager.get().and_then(Weak::upgrade)
    }
}

impl FieldInterceptor for TestHandler {}
impl MethodInterceptor for TestHandler {}

impl ConstructorInterceptor for TestHandler {
    fn on_constructor_call(
        &self,
        context: &mut ConstructorInvocationContext<'_>,
    ) -> ContainerResult<()> {
        self.events.lock().push(format!("{}:construct", self.name));
        context.proceed()?;
        Ok(())
    }
}

impl Handler for TestHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn configure(
        self: Arc<Self>,
        manager: &Arc<InstanceManager>,
        _metadata: &ComponentMetadata,
        _configuration: &Configuration,
    ) -> ContainerResult<()> {
        let _ = self.manager.set(Arc::downgrade(manager));
        self.events.lock().push(format!("{}:configure", self.name));
        Ok(())
    }

    fn start(&self) -> ContainerResult<()> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(ContainerError::IllegalState(format!(
                "{} cannot start",
                self.name
            )));
        }
        self.events.lock().push(format!("{}:start", self.name));
        Ok(())
    }

    fn stop(&self) {
        self.events.lock().push(format!("{}:stop", self.name));
    }

    fn dispose(&self) {
        self.events.lock().push(format!("{}:dispose", self.name));
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn state_changed(&self, state: InstanceState) -> ContainerResult<()> {
        self.events.lock().push(format!("{}:{:?}", self.name, state));
        if *self.reject_state.lock() == Some(state) {
            return Err(ContainerError::IllegalState(format!(
                "{} rejects {:?}",
                self.name, state
            )));
        }
        Ok(())
    }
}
