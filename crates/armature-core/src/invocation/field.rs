//! Field invocation context

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::class::FieldDescriptor;
use crate::error::{ContainerError, ContainerResult};
use crate::interceptor::FieldInterceptor;
use crate::manager::InstanceManager;
use crate::object::ManagedObject;
use crate::value::Value;

/// The kind of field access being intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// The managed code is reading the field.
    Read,
    /// The managed code (or a handler) is writing the field.
    Write,
}

/// Invocation context for one field access.
///
/// Not reusable: one context drives one traversal of one chain snapshot.
pub struct FieldInvocationContext<'a> {
    manager: &'a InstanceManager,
    chain: Vec<Arc<dyn FieldInterceptor>>,
    position: usize,
    field: &'a FieldDescriptor,
    kind: AccessKind,
    target: Option<&'a Arc<ManagedObject>>,
    final_value: Option<Value>,
    completed: bool,
    context_data: FxHashMap<String, Value>,
}

impl<'a> FieldInvocationContext<'a> {
    pub(crate) fn new(
        manager: &'a InstanceManager,
        chain: Vec<Arc<dyn FieldInterceptor>>,
        target: Option<&'a Arc<ManagedObject>>,
        kind: AccessKind,
        field: &'a FieldDescriptor,
    ) -> Self {
        Self {
            manager,
            chain,
            position: 0,
            field,
            kind,
            target,
            final_value: None,
            completed: false,
            context_data: FxHashMap::default(),
        }
    }

    /// The kind of this field access.
    pub fn kind(&self) -> AccessKind {
        self.kind
    }

    /// The field being accessed.
    pub fn field(&self) -> &FieldDescriptor {
        self.field
    }

    /// The object being accessed, absent when the access originates from
    /// a handler rather than managed code.
    pub fn target(&self) -> Option<&Arc<ManagedObject>> {
        self.target
    }

    /// Arbitrary data shared between the interceptors of this chain.
    pub fn context_data(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.context_data
    }

    /// Call the next interceptor in the chain, or perform the field
    /// access once the tail is reached.
    ///
    /// `value` is the value proposed so far; the returned value is the
    /// one the tail resolved. The value is type-checked against the
    /// declared field type on every step.
    pub fn proceed(&mut self, value: Value) -> ContainerResult<Value> {
        self.check_value(&value)?;

        if self.completed {
            return Err(ContainerError::ReentrantProceed);
        }

        if self.position < self.chain.len() {
            let index = self.position;
            let next = self.chain[index].clone();
            self.position += 1;

            next.on_field_access(self, value)?;

            // The interceptor must have driven the chain to its tail.
            if !self.completed {
                return Err(ContainerError::BrokenChain { position: index });
            }
        } else {
            // Tail reached: perform the real write into the value store
            // and every live object, for reads as well, so storage stays
            // in sync with the resolved value.
            self.final_value = Some(value.clone());
            self.completed = true;
            self.manager.do_set_field(self.target, self.field, value);
        }

        Ok(self.final_value.clone().unwrap_or_default())
    }

    fn check_value(&self, value: &Value) -> ContainerResult<()> {
        if value.is_null() {
            if self.field.ty.is_primitive() {
                return Err(ContainerError::NullToPrimitive(self.field.name.to_string()));
            }
            return Ok(());
        }
        if !self.field.ty.accepts(value) {
            return Err(ContainerError::TypeMismatch {
                member: self.field.name.to_string(),
                expected: self.field.ty.to_string(),
                found: value.kind().to_string(),
            });
        }
        Ok(())
    }
}
