//! Instance introspection snapshots

use serde::Serialize;

use crate::lifecycle::InstanceState;

/// Point-in-time description of a handler attached to an instance.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerDescription {
    /// Handler name.
    pub name: String,
    /// Handler validity at snapshot time.
    pub valid: bool,
}

/// Point-in-time description of a component instance.
///
/// A plain data snapshot: it does not track the instance after creation.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceDescription {
    /// Instance name.
    pub name: String,
    /// Implementation class name.
    pub class_name: String,
    /// Lifecycle state at snapshot time.
    pub state: InstanceState,
    /// Attached handlers, in attachment order.
    pub handlers: Vec<HandlerDescription>,
    /// Number of live managed objects.
    pub managed_objects: usize,
    /// Fields with at least one registered interceptor.
    pub registered_fields: Vec<String>,
    /// Methods with at least one registered interceptor.
    pub registered_methods: Vec<String>,
}

impl InstanceDescription {
    /// Serialize the description to JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
