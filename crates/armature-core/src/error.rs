//! Container error taxonomy
//!
//! Errors raised by the interception machinery fall in two families:
//! member-raised errors (`Target`, plus whatever a method or constructor
//! body returns) which propagate unchanged to the original call site, and
//! structural/protocol violations which force the owning instance manager
//! to stop before being re-signaled wrapped in `CreationFailed` or
//! `ChainFailed`.

use thiserror::Error;

/// Errors produced by the container runtime.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A value is not assignable to the declared type of a member.
    #[error("type mismatch on {member}: expected {expected}, got {found}")]
    TypeMismatch {
        /// The member (field, method or parameter) being accessed.
        member: String,
        /// The declared type.
        expected: String,
        /// What was actually supplied.
        found: String,
    },

    /// Null was proposed for a primitive-typed member.
    #[error("cannot assign null to primitive member {0}")]
    NullToPrimitive(String),

    /// An interceptor returned successfully without driving the chain to
    /// its tail.
    #[error("interceptor at position {position} returned without proceeding")]
    BrokenChain {
        /// Index of the offending interceptor in the dispatched chain.
        position: usize,
    },

    /// `proceed()` was called again on a context whose chain already
    /// completed.
    #[error("proceed() called again on a completed invocation context")]
    ReentrantProceed,

    /// The parameter list was modified after the chain tail fixed it.
    #[error("parameters are fixed once the chain tail has been reached")]
    ParametersFixed,

    /// No declared constructor matches the supplied parameters.
    #[error("no suitable constructor on {class} for {supplied} supplied parameter(s)")]
    NoSuitableConstructor {
        /// The class under construction.
        class: String,
        /// Number of parameters supplied by the interception chain.
        supplied: usize,
    },

    /// The configured factory method does not exist on the class.
    #[error("factory method {method} not found on class {class}")]
    MissingFactoryMethod {
        /// The class under construction.
        class: String,
        /// The missing factory method name.
        method: String,
    },

    /// No bootstrap hook exists anywhere in the class lineage.
    #[error("class {0} has no bootstrap hook in its lineage")]
    MissingBootstrap(String),

    /// The named field is not declared on the class.
    #[error("unknown field {field} on class {class}")]
    NoSuchField {
        /// The class that was searched.
        class: String,
        /// The missing field name.
        field: String,
    },

    /// The method id is not declared on the class.
    #[error("unknown method {method} on class {class}")]
    NoSuchMethod {
        /// The class that was searched.
        class: String,
        /// The missing method id.
        method: String,
    },

    /// The class descriptor could not be resolved.
    #[error("class {0} is not registered")]
    ClassNotFound(String),

    /// An adopted object does not belong to the configured class lineage.
    #[error("adopted object is a {found}, expected an instance of {expected}")]
    AdoptedObjectMismatch {
        /// The configured implementation class.
        expected: String,
        /// The class of the adopted object.
        found: String,
    },

    /// An operation was attempted in a lifecycle state that forbids it.
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// The instance configuration is incomplete or inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An error raised by the intercepted member itself (or by a handler
    /// on its behalf). Passes through the machinery unchanged.
    #[error("{0}")]
    Target(String),

    /// A managed object could not be created; wraps the original cause.
    #[error("cannot create a managed object for instance {instance}")]
    CreationFailed {
        /// The owning instance name.
        instance: String,
        /// The underlying failure.
        #[source]
        source: Box<ContainerError>,
    },

    /// An interception chain failed during field or method dispatch;
    /// wraps the original cause.
    #[error("interception chain failed on {member}")]
    ChainFailed {
        /// The member whose chain failed.
        member: String,
        /// The underlying failure.
        #[source]
        source: Box<ContainerError>,
    },
}

impl ContainerError {
    /// Whether this error is a violation of the interception protocol
    /// itself, as opposed to an error raised by the intercepted member.
    ///
    /// Protocol violations corrupt the chain state model and force the
    /// owning instance manager to stop.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            ContainerError::BrokenChain { .. } | ContainerError::ReentrantProceed
        )
    }
}

/// Container operation result.
pub type ContainerResult<T> = Result<T, ContainerError>;
