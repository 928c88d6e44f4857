//! Constructor invocation context

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{error, warn};

use crate::class::{ClassDescriptor, ConstructorDescriptor};
use crate::error::{ContainerError, ContainerResult};
use crate::interceptor::ConstructorInterceptor;
use crate::manager::InstanceManager;
use crate::object::ManagedObject;
use crate::value::{Value, ValueType};

/// How the managed object comes into existence at the chain tail.
#[derive(Clone)]
enum Mode {
    /// Resolve and invoke a declared constructor.
    Construct,
    /// A pre-built object is adopted; no constructor is invoked.
    Adopt,
    /// A static factory method builds the object.
    Factory(Arc<str>),
}

/// Invocation context for one managed object construction.
///
/// Not reusable: one context drives one traversal of one chain snapshot.
pub struct ConstructorInvocationContext<'a> {
    manager: &'a Arc<InstanceManager>,
    chain: Vec<Arc<dyn ConstructorInterceptor>>,
    position: usize,
    mode: Mode,
    constructor: Option<Arc<ConstructorDescriptor>>,
    object: Option<Arc<ManagedObject>>,
    params: Vec<Value>,
    params_fixed: bool,
    completed: bool,
    context_data: FxHashMap<String, Value>,
}

impl<'a> ConstructorInvocationContext<'a> {
    /// Context for normal construction through a declared constructor.
    pub(crate) fn new_construct(
        manager: &'a Arc<InstanceManager>,
        chain: Vec<Arc<dyn ConstructorInterceptor>>,
    ) -> Self {
        Self::with_mode(manager, chain, Mode::Construct, None)
    }

    /// Pseudo-construction context for an adopted object: the object
    /// already exists, the chain only gets notified.
    pub(crate) fn new_adopt(
        manager: &'a Arc<InstanceManager>,
        chain: Vec<Arc<dyn ConstructorInterceptor>>,
        object: Arc<ManagedObject>,
    ) -> Self {
        Self::with_mode(manager, chain, Mode::Adopt, Some(object))
    }

    /// Context for construction through a static factory method.
    pub(crate) fn new_factory(
        manager: &'a Arc<InstanceManager>,
        chain: Vec<Arc<dyn ConstructorInterceptor>>,
        factory_method: Arc<str>,
    ) -> Self {
        Self::with_mode(manager, chain, Mode::Factory(factory_method), None)
    }

    fn with_mode(
        manager: &'a Arc<InstanceManager>,
        chain: Vec<Arc<dyn ConstructorInterceptor>>,
        mode: Mode,
        object: Option<Arc<ManagedObject>>,
    ) -> Self {
        Self {
            manager,
            chain,
            position: 0,
            mode,
            constructor: None,
            object,
            params: Vec::new(),
            params_fixed: false,
            completed: false,
            context_data: FxHashMap::default(),
        }
    }

    /// The constructor that was chosen, or `None` until the tail resolved
    /// one (and always `None` for adopted or factory-built objects).
    pub fn constructor(&self) -> Option<&Arc<ConstructorDescriptor>> {
        self.constructor.as_ref()
    }

    /// The object being constructed, or `None` until the tail has been
    /// reached.
    pub fn object(&self) -> Option<&Arc<ManagedObject>> {
        self.object.as_ref()
    }

    /// The constructor parameters accumulated so far. The leading manager
    /// reference is injected at the tail, not visible here.
    pub fn parameters(&self) -> &[Value] {
        &self.params
    }

    /// The parameter list, freely modifiable until the tail fixes it.
    pub fn parameters_mut(&mut self) -> ContainerResult<&mut Vec<Value>> {
        if self.params_fixed {
            return Err(ContainerError::ParametersFixed);
        }
        Ok(&mut self.params)
    }

    /// Arbitrary data shared between the interceptors of this chain.
    pub fn context_data(&mut self) -> &mut FxHashMap<String, Value> {
        &mut self.context_data
    }

    /// Call the next interceptor in the chain, or build the object once
    /// the tail is reached.
    pub fn proceed(&mut self) -> ContainerResult<Arc<ManagedObject>> {
        if self.completed {
            return Err(ContainerError::ReentrantProceed);
        }

        if self.position == self.chain.len() {
            return self.do_proceed();
        }

        let index = self.position;
        let next = self.chain[index].clone();
        self.position += 1;

        next.on_constructor_call(self)?;

        // Every interceptor must call through: after the call the object
        // must exist.
        match &self.object {
            Some(object) => Ok(object.clone()),
            None => Err(ContainerError::BrokenChain { position: index }),
        }
    }

    /// The real construction, executed at the end of the chain.
    fn do_proceed(&mut self) -> ContainerResult<Arc<ManagedObject>> {
        // Inject the manager as the leading parameter.
        self.params.insert(0, Value::Manager(self.manager.clone()));

        match self.mode.clone() {
            Mode::Adopt => {
                self.params_fixed = true;
                self.completed = true;
                self.object.clone().ok_or_else(|| {
                    ContainerError::IllegalState("adopted object missing from context".into())
                })
            }
            Mode::Factory(name) => self.do_proceed_with_factory(&name),
            Mode::Construct => {
                let class = self.manager.class()?;
                let constructor = self.find_suitable_constructor(&class)?;
                self.params_fixed = true;
                let object = (constructor.body)(&class, &self.params)?;
                object.attach_manager(self.manager);
                self.constructor = Some(constructor);
                self.completed = true;
                self.object = Some(object.clone());
                Ok(object)
            }
        }
    }

    /// Find the constructor to invoke, according to the parameters.
    ///
    /// Candidates must accept at least as many parameters as supplied,
    /// with the first parameter typed as the manager; trailing unset
    /// parameters are padded with null and checked for assignability.
    /// Fewer parameters win; declaration order breaks ties.
    fn find_suitable_constructor(
        &mut self,
        class: &Arc<ClassDescriptor>,
    ) -> ContainerResult<Arc<ConstructorDescriptor>> {
        let supplied = self.params.len();

        let mut candidates: Vec<Arc<ConstructorDescriptor>> = class
            .constructors()
            .iter()
            .filter(|constructor| {
                let types = &constructor.param_types;
                if types.len() < supplied || types.first() != Some(&ValueType::Manager) {
                    return false;
                }
                types.iter().enumerate().all(|(index, ty)| {
                    let value = self.params.get(index).unwrap_or(&Value::Null);
                    if value.is_null() {
                        !ty.is_primitive()
                    } else {
                        ty.accepts(value)
                    }
                })
            })
            .cloned()
            .collect();

        if candidates.is_empty() {
            return Err(ContainerError::NoSuitableConstructor {
                class: class.name().to_string(),
                // Do not count the injected manager reference.
                supplied: supplied.saturating_sub(1),
            });
        }

        if candidates.len() > 1 {
            // Stable sort keeps declaration order between candidates with
            // the same parameter count.
            candidates.sort_by_key(|c| c.param_types.len());
            warn!(
                instance = %self.manager.name(),
                class = %class.name(),
                candidates = candidates.len(),
                "multiple constructors match the supplied parameters"
            );
        }

        let chosen = candidates.swap_remove(0);

        // Pad with nulls up to the chosen arity.
        while self.params.len() < chosen.param_types.len() {
            self.params.push(Value::Null);
        }

        // Fill the first unset context-typed parameter with the ambient
        // runtime context.
        for (index, ty) in chosen.param_types.iter().enumerate() {
            if *ty == ValueType::Context && self.params[index].is_null() {
                self.params[index] = Value::Context(self.manager.context().clone());
                break;
            }
        }

        Ok(chosen)
    }

    /// Same as [`do_proceed`](Self::do_proceed), but through a static
    /// factory method followed by the bootstrap hook that wires the
    /// object back to the manager.
    fn do_proceed_with_factory(&mut self, name: &str) -> ContainerResult<Arc<ManagedObject>> {
        let class = self.manager.class()?;

        let Some(factory) = class.factory_method(name) else {
            error!(
                instance = %self.manager.name(),
                class = %class.name(),
                method = name,
                "factory method not found"
            );
            self.manager.stop();
            return Err(ContainerError::MissingFactoryMethod {
                class: class.name().to_string(),
                method: name.to_string(),
            });
        };

        let context = self.manager.context().clone();
        let object = (factory.body)(&class, factory.takes_context.then_some(&context))?;

        let Some(bootstrap) = object.class().find_bootstrap() else {
            error!(
                instance = %self.manager.name(),
                class = %object.class().name(),
                "no bootstrap hook in the class lineage"
            );
            self.manager.stop();
            return Err(ContainerError::MissingBootstrap(
                object.class().name().to_string(),
            ));
        };
        bootstrap(&object, self.manager)?;

        self.params_fixed = true;
        self.completed = true;
        self.object = Some(object.clone());
        Ok(object)
    }
}
