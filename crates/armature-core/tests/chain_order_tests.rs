//! Chain ordering tests
//!
//! Validate the dispatch order rules: the snapshot is built by walking
//! priority buckets in ascending order and reversing, so the highest
//! priority number is dispatched first and handlers registered at
//! `CORE_PRIORITY` run immediately before the real operation.

mod common;

use std::sync::Arc;

use armature_core::{
    ClassRegistry, ComponentFactory, ComponentMetadata, Configuration, ContainerResult,
    FieldInterceptor, FieldInvocationContext, RuntimeContext, Value,
};

use common::{entries, new_log, point_class, point_instance, Recorder, TestHandler};

// ===== Priority ordering =====

#[test]
fn test_higher_priority_number_dispatches_first() {
    let manager = point_instance();
    let log = new_log();

    manager.register_field_interceptor_with_priority(10, "x", Recorder::new("a", &log));
    manager.register_field_interceptor_with_priority(5, "x", Recorder::new("b", &log));

    manager.on_set(None, "x", Value::Int(1)).unwrap();

    // Priority 10 is the chain head; priority 5 runs closest to the
    // real operation.
    assert_eq!(entries(&log), vec!["a", "b"]);
}

#[test]
fn test_earliest_registration_runs_innermost_on_ties() {
    let manager = point_instance();
    let log = new_log();

    manager.register_field_interceptor_with_priority(1, "x", Recorder::new("first", &log));
    manager.register_field_interceptor_with_priority(1, "x", Recorder::new("second", &log));

    manager.on_set(None, "x", Value::Int(1)).unwrap();

    assert_eq!(entries(&log), vec!["second", "first"]);
}

#[test]
fn test_default_priority_is_the_chain_head() {
    let manager = point_instance();
    let log = new_log();

    manager.register_field_interceptor_with_priority(0, "x", Recorder::new("explicit", &log));
    manager.register_field_interceptor("x", Recorder::new("default", &log));

    manager.on_set(None, "x", Value::Int(1)).unwrap();

    assert_eq!(entries(&log), vec!["default", "explicit"]);
}

#[test]
fn test_chains_are_per_key() {
    let manager = point_instance();
    let log = new_log();

    manager.register_field_interceptor("x", Recorder::new("on-x", &log));
    manager.register_field_interceptor("y", Recorder::new("on-y", &log));

    manager.on_set(None, "y", Value::Int(2)).unwrap();

    assert_eq!(entries(&log), vec!["on-y"]);
}

// ===== Snapshot isolation =====

/// Interceptor that registers another interceptor for the same field
/// while the chain is being dispatched.
struct SelfExtending {
    manager: Arc<armature_core::InstanceManager>,
    log: common::Log,
}

impl FieldInterceptor for SelfExtending {
    fn on_field_access(
        &self,
        context: &mut FieldInvocationContext<'_>,
        value: Value,
    ) -> ContainerResult<()> {
        self.log.lock().push("extending".into());
        self.manager
            .register_field_interceptor("x", Recorder::new("late", &self.log));
        context.proceed(value)?;
        Ok(())
    }
}

#[test]
fn test_concurrent_registration_does_not_affect_inflight_snapshot() {
    let manager = point_instance();
    let log = new_log();

    manager.register_field_interceptor(
        "x",
        Arc::new(SelfExtending {
            manager: manager.clone(),
            log: log.clone(),
        }),
    );

    // First traversal: only the extending interceptor runs.
    manager.on_set(None, "x", Value::Int(1)).unwrap();
    assert_eq!(entries(&log), vec!["extending"]);

    // Second traversal uses a fresh snapshot and sees the late
    // registration.
    manager.on_set(None, "x", Value::Int(2)).unwrap();
    assert_eq!(entries(&log), vec!["extending", "late", "extending"]);
}

// ===== Constructor chain =====

#[test]
fn test_handlers_run_innermost_on_the_constructor_chain() {
    let events = new_log();
    let events_for_handler = events.clone();

    let classes = ClassRegistry::new();
    classes.register(point_class());
    let factory = ComponentFactory::new(
        ComponentMetadata::new("Point"),
        classes,
        RuntimeContext::new(),
    )
    .with_handler(move || {
        let handler: Arc<dyn armature_core::Handler> = TestHandler::new("h", &events_for_handler);
        handler
    })
    .build();

    let manager = factory.create_instance(&Configuration::new()).unwrap();
    manager.start().unwrap();
    events.lock().clear();

    // A default-priority constructor interceptor wraps the handler.
    manager.register_constructor_interceptor(Recorder::new("outer", &events));
    manager.create_managed_object().unwrap();

    assert_eq!(entries(&events), vec!["outer", "h:construct"]);
}
