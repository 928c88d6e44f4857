//! Invocation contexts
//!
//! An invocation context drives one interception chain to completion. It
//! owns the chain snapshot and a cursor; each interceptor receives the
//! context, may veto or transform the in-flight value, and calls
//! `proceed` to hand control inward. The tail of the chain performs the
//! real operation through the class's member accessors.

mod constructor;
mod field;
mod method;

pub use constructor::ConstructorInvocationContext;
pub use field::{AccessKind, FieldInvocationContext};
pub use method::{MethodInvocationContext, Parameters};
