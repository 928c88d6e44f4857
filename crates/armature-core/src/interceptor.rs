//! Interceptor traits
//!
//! An interceptor is notified of an access event before the real operation
//! executes and drives the chain onward by calling `proceed`, exactly
//! once, on the context it receives. Returning `Ok` without having
//! reached the chain tail is a broken chain; returning `Err` short-circuits
//! deliberately and propagates to the dispatch entry point.
//!
//! All three traits default to pass-through behavior, so a handler only
//! overrides the roles it cares about.

use crate::error::ContainerResult;
use crate::invocation::{ConstructorInvocationContext, FieldInvocationContext, MethodInvocationContext};
use crate::value::Value;

/// Interceptor notified of field read/write access.
pub trait FieldInterceptor: Send + Sync {
    /// Called on every access of a monitored field, with the value
    /// proposed so far. The default implementation just proceeds.
    fn on_field_access(
        &self,
        context: &mut FieldInvocationContext<'_>,
        value: Value,
    ) -> ContainerResult<()> {
        context.proceed(value)?;
        Ok(())
    }
}

/// Interceptor notified of method calls.
pub trait MethodInterceptor: Send + Sync {
    /// Called on every invocation of a monitored method. The returned
    /// value becomes the invocation result seen by the next-outer
    /// interceptor. The default implementation just proceeds.
    fn on_method_call(&self, context: &mut MethodInvocationContext<'_>) -> ContainerResult<Value> {
        context.proceed()
    }
}

/// Interceptor notified of managed object construction.
pub trait ConstructorInterceptor: Send + Sync {
    /// Called when a managed object is about to be created. The default
    /// implementation just proceeds.
    fn on_constructor_call(
        &self,
        context: &mut ConstructorInvocationContext<'_>,
    ) -> ContainerResult<()> {
        context.proceed()?;
        Ok(())
    }
}
