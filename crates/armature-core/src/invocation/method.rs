//! Method invocation context

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::class::MethodDescriptor;
use crate::error::{ContainerError, ContainerResult};
use crate::interceptor::MethodInterceptor;
use crate::object::ManagedObject;
use crate::value::{Value, ValueType};

/// The parameter list of an intercepted method call.
///
/// Structurally immutable: elements can be replaced but never inserted or
/// removed, so interceptors cannot change the arity of the call. Every
/// replacement is checked against the declared parameter type at that
/// index. Once the chain tail has been reached (or any interceptor call
/// has returned), the list is permanently fixed.
pub struct Parameters {
    types: Vec<ValueType>,
    values: Vec<Value>,
    fixed: bool,
}

impl Parameters {
    pub(crate) fn new(types: Vec<ValueType>, values: Vec<Value>) -> Self {
        debug_assert_eq!(types.len(), values.len());
        Self {
            types,
            values,
            fixed: false,
        }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the call has no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a parameter.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Replace a parameter, returning the previous value.
    ///
    /// Fails once the list is fixed, when the index is out of bounds, or
    /// when the value is not assignable to the declared type at `index`.
    pub fn set(&mut self, index: usize, value: Value) -> ContainerResult<Value> {
        if self.fixed {
            return Err(ContainerError::ParametersFixed);
        }
        let ty = self.types.get(index).ok_or_else(|| {
            ContainerError::IllegalState(format!("parameter index {} out of bounds", index))
        })?;
        if value.is_null() {
            if ty.is_primitive() {
                return Err(ContainerError::NullToPrimitive(format!("parameter {}", index)));
            }
        } else if !ty.accepts(&value) {
            return Err(ContainerError::TypeMismatch {
                member: format!("parameter {}", index),
                expected: ty.to_string(),
                found: value.kind().to_string(),
            });
        }
        Ok(std::mem::replace(&mut self.values[index], value))
    }

    /// The parameters as a slice.
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    /// Iterate over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Whether the list has been fixed.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub(crate) fn fix(&mut self) {
        self.fixed = true;
    }
}

/// Invocation context for one method call.
///
/// Not reusable: one context drives one traversal of one chain snapshot.
pub struct MethodInvocationContext<'a> {
    chain: Vec<Arc<dyn MethodInterceptor>>,
    position: usize,
    target: Option<&'a Arc<ManagedObject>>,
    method: Arc<MethodDescriptor>,
    params: Parameters,
    completed: bool,
    context_data: FxHashMap<String, Value>,
}

impl<'a> MethodInvocationContext<'a> {
    pub(crate) fn new(
        chain: Vec<Arc<dyn MethodInterceptor>>,
        target: Option<&'a Arc<ManagedObject>>,
        method: Arc<MethodDescriptor>,
        args: Vec<Value>,
    ) -> Self {
        let params = Parameters::new(method.param_types.clone(), args);
        Self {
            chain,
            position: 0,
            target,
            method,
            params,
            completed: false,
            context_data: FxHashMap::default(),
        }
    }

    /// The method being called.
    pub fn method(&self) -> &Arc<MethodDescriptor> {
        &self.method
    }

    /// The object being called, absent for handler-driven calls.
    pub fn target(&self) -> Option<&Arc<ManagedObject>> {
        self.target
    }

    /// The parameter list.
    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// The parameter list, for in-place replacement.
    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    /// Arbitrary data shared between the interceptors of this chain.
    pub fn context_data(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.context_data
    }

    /// Call the next interceptor in the chain, or invoke the real method
    /// once the tail is reached.
    ///
    /// The result of the real method propagates outward; each interceptor
    /// may substitute its own. Errors raised by the method body propagate
    /// unchanged.
    pub fn proceed(&mut self) -> ContainerResult<Value> {
        if self.completed {
            return Err(ContainerError::ReentrantProceed);
        }

        if self.position == self.chain.len() {
            return self.do_proceed();
        }

        let index = self.position;
        let next = self.chain[index].clone();
        self.position += 1;

        let result = next.on_method_call(self);

        // The parameter list is fixed whether the interceptor succeeded
        // or not.
        self.params.fix();

        let value = result?;
        if !self.completed {
            return Err(ContainerError::BrokenChain { position: index });
        }
        Ok(value)
    }

    /// The real method call, executed at the end of the chain.
    fn do_proceed(&mut self) -> ContainerResult<Value> {
        self.params.fix();
        self.completed = true;
        (self.method.body)(self.target, self.params.as_slice())
    }
}
