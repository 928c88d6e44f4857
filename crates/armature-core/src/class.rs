//! Class model and member accessors
//!
//! A [`ClassDescriptor`] is the load-time resolution of a component
//! implementation class: every member carries both its declared shape
//! (name, types) and the accessor closure that performs the real
//! operation at the tail of an interception chain. There is no runtime
//! reflection; member dispatch is a map lookup plus a direct call.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::RuntimeContext;
use crate::error::ContainerResult;
use crate::manager::InstanceManager;
use crate::object::ManagedObject;
use crate::value::{Value, ValueType};

/// Method body: receives the target object (absent for handler-driven
/// calls) and the fixed parameter list.
pub type MethodFn =
    Arc<dyn Fn(Option<&Arc<ManagedObject>>, &[Value]) -> ContainerResult<Value> + Send + Sync>;

/// Constructor body: receives the class under construction and the full
/// parameter list, whose leading element is the manager reference.
pub type ConstructorFn =
    Arc<dyn Fn(&Arc<ClassDescriptor>, &[Value]) -> ContainerResult<Arc<ManagedObject>> + Send + Sync>;

/// Factory-method body: builds an object without going through a declared
/// constructor. Receives the runtime context when the descriptor asks for
/// it.
pub type FactoryFn = Arc<
    dyn Fn(&Arc<ClassDescriptor>, Option<&Arc<RuntimeContext>>) -> ContainerResult<Arc<ManagedObject>>
        + Send
        + Sync,
>;

/// Bootstrap hook: wires an object constructed outside the normal path
/// (factory method, adopted object) back to its instance manager.
pub type BootstrapFn =
    Arc<dyn Fn(&Arc<ManagedObject>, &Arc<InstanceManager>) -> ContainerResult<()> + Send + Sync>;

/// A declared field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: Arc<str>,
    /// Declared type, checked on every chain step.
    pub ty: ValueType,
    /// Index into the object's field storage.
    pub index: usize,
}

/// A declared method.
pub struct MethodDescriptor {
    /// Method identifier, unique within the class.
    pub id: Arc<str>,
    /// Declared parameter types.
    pub param_types: Vec<ValueType>,
    /// The accessor invoked at the chain tail.
    pub body: MethodFn,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("id", &self.id)
            .field("param_types", &self.param_types)
            .finish_non_exhaustive()
    }
}

/// A declared constructor. Declaration order is preserved by the class
/// and breaks ties during constructor resolution.
pub struct ConstructorDescriptor {
    /// Declared parameter types. The first must be [`ValueType::Manager`]
    /// for the constructor to be a resolution candidate.
    pub param_types: Vec<ValueType>,
    /// The accessor invoked at the chain tail.
    pub body: ConstructorFn,
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("param_types", &self.param_types)
            .finish_non_exhaustive()
    }
}

/// A declared static factory method.
pub struct FactoryMethod {
    /// Factory method name.
    pub name: Arc<str>,
    /// Whether the body receives the runtime context.
    pub takes_context: bool,
    /// The factory body.
    pub body: FactoryFn,
}

impl fmt::Debug for FactoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryMethod")
            .field("name", &self.name)
            .field("takes_context", &self.takes_context)
            .finish_non_exhaustive()
    }
}

/// Load-time description of a component implementation class.
pub struct ClassDescriptor {
    name: Arc<str>,
    parent: Option<Arc<ClassDescriptor>>,
    fields: Vec<FieldDescriptor>,
    field_index: FxHashMap<String, usize>,
    methods: FxHashMap<String, Arc<MethodDescriptor>>,
    constructors: Vec<Arc<ConstructorDescriptor>>,
    factory_methods: FxHashMap<String, Arc<FactoryMethod>>,
    bootstrap: Option<BootstrapFn>,
}

impl ClassDescriptor {
    /// Start building a class descriptor.
    pub fn builder(name: impl Into<Arc<str>>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent class, if any. The lineage is used for assignability and
    /// bootstrap lookup; field storage is not inherited.
    pub fn parent(&self) -> Option<&Arc<ClassDescriptor>> {
        self.parent.as_ref()
    }

    /// Declared fields, in storage order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of declared fields; the size of an object's field storage.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index.get(name).map(|i| &self.fields[*i])
    }

    /// Look up a method by id.
    pub fn method(&self, id: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods.get(id).cloned()
    }

    /// Iterate over the declared methods.
    pub fn methods(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.methods.values()
    }

    /// Declared constructors, in declaration order.
    pub fn constructors(&self) -> &[Arc<ConstructorDescriptor>] {
        &self.constructors
    }

    /// Look up a factory method by name. Factory methods are not
    /// inherited.
    pub fn factory_method(&self, name: &str) -> Option<Arc<FactoryMethod>> {
        self.factory_methods.get(name).cloned()
    }

    /// Find the bootstrap hook, walking up the class lineage until one is
    /// declared.
    pub fn find_bootstrap(&self) -> Option<BootstrapFn> {
        let mut class = Some(self);
        while let Some(c) = class {
            if let Some(bootstrap) = &c.bootstrap {
                return Some(bootstrap.clone());
            }
            class = c.parent.as_deref();
        }
        None
    }

    /// Whether this class is `name` or has `name` in its lineage.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        let mut class = Some(self);
        while let Some(c) = class {
            if &*c.name == name {
                return true;
            }
            class = c.parent.as_deref();
        }
        false
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}

/// Builder assembling a [`ClassDescriptor`].
pub struct ClassBuilder {
    name: Arc<str>,
    parent: Option<Arc<ClassDescriptor>>,
    fields: Vec<FieldDescriptor>,
    methods: FxHashMap<String, Arc<MethodDescriptor>>,
    constructors: Vec<Arc<ConstructorDescriptor>>,
    factory_methods: FxHashMap<String, Arc<FactoryMethod>>,
    bootstrap: Option<BootstrapFn>,
}

impl ClassBuilder {
    /// Start a builder for the named class.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
            methods: FxHashMap::default(),
            constructors: Vec::new(),
            factory_methods: FxHashMap::default(),
            bootstrap: None,
        }
    }

    /// Set the parent class.
    pub fn parent(mut self, parent: Arc<ClassDescriptor>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Declare a field. Storage index follows declaration order.
    pub fn field(mut self, name: impl Into<Arc<str>>, ty: ValueType) -> Self {
        let name = name.into();
        let index = self.fields.len();
        self.fields.push(FieldDescriptor { name, ty, index });
        self
    }

    /// Declare a method.
    pub fn method(
        mut self,
        id: impl Into<Arc<str>>,
        param_types: Vec<ValueType>,
        body: impl Fn(Option<&Arc<ManagedObject>>, &[Value]) -> ContainerResult<Value>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        let id = id.into();
        self.methods.insert(
            id.to_string(),
            Arc::new(MethodDescriptor {
                id,
                param_types,
                body: Arc::new(body),
            }),
        );
        self
    }

    /// Declare a constructor. Declaration order is significant: it breaks
    /// ties between resolution candidates with equal parameter counts.
    pub fn constructor(
        mut self,
        param_types: Vec<ValueType>,
        body: impl Fn(&Arc<ClassDescriptor>, &[Value]) -> ContainerResult<Arc<ManagedObject>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.constructors.push(Arc::new(ConstructorDescriptor {
            param_types,
            body: Arc::new(body),
        }));
        self
    }

    /// Declare a static factory method.
    pub fn factory_method(
        mut self,
        name: impl Into<Arc<str>>,
        takes_context: bool,
        body: impl Fn(&Arc<ClassDescriptor>, Option<&Arc<RuntimeContext>>) -> ContainerResult<Arc<ManagedObject>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        let name = name.into();
        self.factory_methods.insert(
            name.to_string(),
            Arc::new(FactoryMethod {
                name,
                takes_context,
                body: Arc::new(body),
            }),
        );
        self
    }

    /// Declare a custom bootstrap hook.
    pub fn bootstrap(
        mut self,
        body: impl Fn(&Arc<ManagedObject>, &Arc<InstanceManager>) -> ContainerResult<()>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.bootstrap = Some(Arc::new(body));
        self
    }

    /// Declare the standard bootstrap hook, which attaches the manager to
    /// the object.
    pub fn default_bootstrap(self) -> Self {
        self.bootstrap(|object, manager| {
            object.attach_manager(manager);
            Ok(())
        })
    }

    /// Build the descriptor.
    pub fn build(self) -> Arc<ClassDescriptor> {
        let field_index = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.index))
            .collect();
        Arc::new(ClassDescriptor {
            name: self.name,
            parent: self.parent,
            fields: self.fields,
            field_index,
            methods: self.methods,
            constructors: self.constructors,
            factory_methods: self.factory_methods,
            bootstrap: self.bootstrap,
        })
    }
}
