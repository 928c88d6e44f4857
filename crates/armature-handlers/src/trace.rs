//! Trace handler
//!
//! Logs every intercepted field access, method call and construction at
//! debug level, then proceeds untouched. Useful when diagnosing chain
//! ordering or handler interactions.

use std::sync::Arc;

use tracing::debug;

use armature_core::{
    ComponentMetadata, Configuration, ConstructorInterceptor, ConstructorInvocationContext,
    ContainerResult, FieldInterceptor, FieldInvocationContext, Handler, InstanceManager,
    MethodInterceptor, MethodInvocationContext, Value,
};

/// Handler logging intercepted accesses.
#[derive(Default)]
pub struct TraceHandler;

impl TraceHandler {
    /// Create a trace handler.
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl FieldInterceptor for TraceHandler {
    fn on_field_access(
        &self,
        context: &mut FieldInvocationContext<'_>,
        value: Value,
    ) -> ContainerResult<()> {
        debug!(
            field = %context.field().name,
            kind = ?context.kind(),
            value = value.kind(),
            "field access"
        );
        context.proceed(value)?;
        Ok(())
    }
}

impl MethodInterceptor for TraceHandler {
    fn on_method_call(&self, context: &mut MethodInvocationContext<'_>) -> ContainerResult<Value> {
        debug!(
            method = %context.method().id,
            params = context.parameters().len(),
            "method call"
        );
        context.proceed()
    }
}

impl ConstructorInterceptor for TraceHandler {
    fn on_constructor_call(
        &self,
        context: &mut ConstructorInvocationContext<'_>,
    ) -> ContainerResult<()> {
        debug!(params = context.parameters().len(), "construction");
        context.proceed()?;
        Ok(())
    }
}

impl Handler for TraceHandler {
    fn name(&self) -> &str {
        "trace"
    }

    fn configure(
        self: Arc<Self>,
        manager: &Arc<InstanceManager>,
        _metadata: &ComponentMetadata,
        _configuration: &Configuration,
    ) -> ContainerResult<()> {
        // Monitor every declared field and method.
        let class = manager.class()?;
        for field in class.fields() {
            manager.register_field_interceptor(&field.name, self.clone());
        }
        for method in class.methods() {
            manager.register_method_interceptor(&method.id, self.clone());
        }
        Ok(())
    }
}
