//! Standard handlers for the armature component container
//!
//! Handlers packaged here cover the common container concerns:
//! - [`PropertiesHandler`] injects configured values into declared fields
//!   through the interception machinery
//! - [`TraceHandler`] logs intercepted accesses

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod properties;
mod trace;

pub use properties::PropertiesHandler;
pub use trace::TraceHandler;
