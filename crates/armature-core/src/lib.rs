//! Armature component container runtime
//!
//! This crate provides the per-instance container runtime including:
//! - Dynamic values and load-time-resolved member accessors
//! - Prioritized interceptor chains over field, method and constructor
//!   access
//! - Invocation contexts driving each chain to its real operation
//! - The instance manager and its lifecycle state machine
//! - The component factory and pluggable handler surface
//!
//! Managed code calls the instance manager's dispatch entry points
//! (`on_get`, `on_set`, `on_method`) on every intercepted access; the
//! manager snapshots the matching interceptor chain, builds an
//! invocation context and lets the context walk the chain outside-in
//! until the tail performs the real operation.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod class;
pub mod config;
pub mod description;
pub mod error;
pub mod factory;
pub mod handler;
pub mod interceptor;
pub mod invocation;
pub mod lifecycle;
pub mod manager;
pub mod object;
pub mod registry;
pub mod value;

pub use class::{
    BootstrapFn, ClassBuilder, ClassDescriptor, ConstructorDescriptor, ConstructorFn, FactoryFn,
    FactoryMethod, FieldDescriptor, MethodDescriptor, MethodFn,
};
pub use config::{Configuration, RuntimeContext, INSTANCE_NAME_PROPERTY, INSTANCE_OBJECT_PROPERTY};
pub use description::{HandlerDescription, InstanceDescription};
pub use error::{ContainerError, ContainerResult};
pub use factory::{ComponentFactory, ComponentMetadata, HandlerProvider};
pub use handler::Handler;
pub use interceptor::{ConstructorInterceptor, FieldInterceptor, MethodInterceptor};
pub use invocation::{
    AccessKind, ConstructorInvocationContext, FieldInvocationContext, MethodInvocationContext,
    Parameters,
};
pub use lifecycle::{InstanceState, InstanceStateListener};
pub use manager::InstanceManager;
pub use object::ManagedObject;
pub use registry::{ClassRegistry, CORE_PRIORITY, DEFAULT_PRIORITY};
pub use value::{Value, ValueType};
