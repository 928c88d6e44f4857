//! Pluggable handlers
//!
//! A handler is a capability attached to an instance manager. It plays
//! all three interceptor roles with pass-through defaults, participates
//! in the instance lifecycle, and contributes its validity to the
//! instance state: the instance is `Valid` only while every handler is.

use std::sync::Arc;

use crate::config::Configuration;
use crate::error::ContainerResult;
use crate::factory::ComponentMetadata;
use crate::interceptor::{ConstructorInterceptor, FieldInterceptor, MethodInterceptor};
use crate::lifecycle::InstanceState;
use crate::manager::InstanceManager;

/// A pluggable capability composing the container of an instance.
///
/// Handlers are attached in a fixed order at instance construction; that
/// order drives lifecycle notifications (ascending when the state
/// increases, descending when it decreases) and teardown (reverse order).
pub trait Handler: FieldInterceptor + MethodInterceptor + ConstructorInterceptor {
    /// The handler name, used for cross-handler lookup.
    fn name(&self) -> &str;

    /// Attach the handler to its instance manager and process the
    /// instance configuration. Called once, before `start`. This is
    /// where a handler registers itself for the fields and methods it
    /// monitors.
    fn configure(
        self: Arc<Self>,
        manager: &Arc<InstanceManager>,
        metadata: &ComponentMetadata,
        configuration: &Configuration,
    ) -> ContainerResult<()>;

    /// Start the handler. An error here aborts the instance start and
    /// forces a stop.
    fn start(&self) -> ContainerResult<()> {
        Ok(())
    }

    /// Stop the handler.
    fn stop(&self) {}

    /// Release the handler. Called once, in reverse attachment order.
    fn dispose(&self) {}

    /// Current validity of the handler. The instance state is the AND of
    /// all handler validities.
    fn is_valid(&self) -> bool {
        true
    }

    /// Called on every instance state transition. Returning an error
    /// signals an illegal transition and forces the instance to stop.
    fn state_changed(&self, _state: InstanceState) -> ContainerResult<()> {
        Ok(())
    }

    /// Push a new configuration into the handler.
    fn reconfigure(&self, _configuration: &Configuration) -> ContainerResult<()> {
        Ok(())
    }
}
