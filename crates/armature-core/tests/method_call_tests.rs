//! Method interception tests

mod common;

use std::sync::Arc;

use armature_core::{
    ContainerError, ContainerResult, InstanceState, MethodInterceptor, MethodInvocationContext,
    Value,
};

use common::{entries, new_log, point_instance, Log, Recorder};

// ===== Plain dispatch =====

#[test]
fn test_method_call_reaches_the_body() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();

    manager.on_set(Some(&object), "x", Value::Int(2)).unwrap();
    manager.on_set(Some(&object), "y", Value::Int(3)).unwrap();

    let result = manager.on_method(Some(&object), "sum", vec![]).unwrap();
    assert_eq!(result.as_int(), Some(5));
}

#[test]
fn test_method_chain_order() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();
    let log = new_log();

    manager.register_method_interceptor_with_priority(10, "sum", Recorder::new("a", &log));
    manager.register_method_interceptor_with_priority(5, "sum", Recorder::new("b", &log));

    manager.on_set(Some(&object), "x", Value::Int(1)).unwrap();
    manager.on_set(Some(&object), "y", Value::Int(1)).unwrap();
    manager.on_method(Some(&object), "sum", vec![]).unwrap();

    assert_eq!(entries(&log), vec!["a", "b"]);
}

#[test]
fn test_unknown_method_is_rejected() {
    let manager = point_instance();
    let err = manager.on_method(None, "nope", vec![]).unwrap_err();
    assert!(matches!(err, ContainerError::NoSuchMethod { .. }));
}

#[test]
fn test_arity_mismatch_is_rejected() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();

    let err = manager
        .on_method(Some(&object), "scale", vec![])
        .unwrap_err();
    assert!(matches!(err, ContainerError::TypeMismatch { .. }));
}

// ===== Parameter list =====

/// Doubles the integer parameter at index 0, then proceeds.
struct Doubler;

impl MethodInterceptor for Doubler {
    fn on_method_call(&self, context: &mut MethodInvocationContext<'_>) -> ContainerResult<Value> {
        let current = context
            .parameters()
            .get(0)
            .and_then(Value::as_int)
            .unwrap_or(0);
        context.parameters_mut().set(0, Value::Int(current * 2))?;
        context.proceed()
    }
}

#[test]
fn test_interceptor_can_replace_parameters() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();

    manager.on_set(Some(&object), "x", Value::Int(3)).unwrap();
    manager.register_method_interceptor("scale", Arc::new(Doubler));

    // scale(2) becomes scale(4).
    manager
        .on_method(Some(&object), "scale", vec![Value::Int(2)])
        .unwrap();

    assert_eq!(manager.field_value("x").and_then(|v| v.as_int()), Some(12));
}

/// Records the outcome of parameter-list misuse.
struct ParamProber {
    log: Log,
}

impl MethodInterceptor for ParamProber {
    fn on_method_call(&self, context: &mut MethodInvocationContext<'_>) -> ContainerResult<Value> {
        // Type-checked replacement: a string is not assignable to the
        // int parameter.
        let type_error = context.parameters_mut().set(0, Value::str("nope"));
        self.log
            .lock()
            .push(format!("set-str:{}", type_error.is_err()));

        let result = context.proceed()?;

        // After the tail the list is permanently fixed.
        let fixed_error = context.parameters_mut().set(0, Value::Int(1));
        self.log.lock().push(format!(
            "set-after-tail:{}",
            matches!(fixed_error, Err(ContainerError::ParametersFixed))
        ));
        Ok(result)
    }
}

#[test]
fn test_parameter_list_is_type_checked_and_fixed_at_tail() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();
    let log = new_log();

    manager.on_set(Some(&object), "x", Value::Int(1)).unwrap();
    manager.register_method_interceptor("scale", Arc::new(ParamProber { log: log.clone() }));

    manager
        .on_method(Some(&object), "scale", vec![Value::Int(5)])
        .unwrap();

    assert_eq!(entries(&log), vec!["set-str:true", "set-after-tail:true"]);
}

// ===== Error propagation =====

#[test]
fn test_target_errors_propagate_unchanged() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();

    let err = manager
        .on_method(Some(&object), "fail", vec![])
        .unwrap_err();

    // The body's own error reaches the call site untouched and the
    // instance keeps running.
    assert!(matches!(err, ContainerError::Target(message) if message == "boom"));
    assert_eq!(manager.state(), InstanceState::Valid);
}

/// Returns a canned value without proceeding.
struct Swallower;

impl MethodInterceptor for Swallower {
    fn on_method_call(
        &self,
        _context: &mut MethodInvocationContext<'_>,
    ) -> ContainerResult<Value> {
        Ok(Value::Int(0))
    }
}

#[test]
fn test_broken_method_chain_stops_the_instance() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();

    manager.on_set(Some(&object), "x", Value::Int(1)).unwrap();
    manager.on_set(Some(&object), "y", Value::Int(1)).unwrap();
    manager.register_method_interceptor("sum", Arc::new(Swallower));

    let err = manager.on_method(Some(&object), "sum", vec![]).unwrap_err();

    match err {
        ContainerError::ChainFailed { source, .. } => {
            assert!(matches!(*source, ContainerError::BrokenChain { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(manager.state(), InstanceState::Stopped);
}

/// Substitutes the result after proceeding.
struct ResultRewriter;

impl MethodInterceptor for ResultRewriter {
    fn on_method_call(&self, context: &mut MethodInvocationContext<'_>) -> ContainerResult<Value> {
        let inner = context.proceed()?;
        Ok(Value::Int(inner.as_int().unwrap_or(0) + 100))
    }
}

#[test]
fn test_interceptor_can_rewrite_the_result() {
    let manager = point_instance();
    let object = manager.managed_object().unwrap();

    manager.on_set(Some(&object), "x", Value::Int(1)).unwrap();
    manager.on_set(Some(&object), "y", Value::Int(2)).unwrap();
    manager.register_method_interceptor("sum", Arc::new(ResultRewriter));

    let result = manager.on_method(Some(&object), "sum", vec![]).unwrap();
    assert_eq!(result.as_int(), Some(103));
}
