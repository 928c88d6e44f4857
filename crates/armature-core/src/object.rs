//! Managed object model

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::class::{ClassDescriptor, FieldDescriptor};
use crate::manager::InstanceManager;
use crate::value::Value;

/// Global counter for generating unique object IDs.
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// The plain instantiated object wrapped by the container.
///
/// Field storage is a flat vector indexed by [`FieldDescriptor::index`].
/// All fields start as null; the instance manager propagates values into
/// the storage through the tail of the field interception chain.
pub struct ManagedObject {
    object_id: u64,
    class: Arc<ClassDescriptor>,
    fields: Mutex<Vec<Value>>,
    manager: OnceCell<Weak<InstanceManager>>,
}

impl ManagedObject {
    /// Create an object of the given class with null-initialized fields.
    pub fn new(class: &Arc<ClassDescriptor>) -> Arc<Self> {
        Arc::new(Self {
            object_id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class: class.clone(),
            fields: Mutex::new(vec![Value::Null; class.field_count()]),
            manager: OnceCell::new(),
        })
    }

    /// Unique object id, assigned at creation.
    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    /// The class of this object.
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// Read a field from storage by index.
    pub fn field(&self, index: usize) -> Option<Value> {
        self.fields.lock().get(index).cloned()
    }

    /// Read a field from storage by name.
    pub fn field_by_name(&self, name: &str) -> Option<Value> {
        self.class.field(name).and_then(|f| self.field(f.index))
    }

    /// Write a field into storage. Bypasses interception; callers go
    /// through the instance manager's dispatch entry points instead.
    pub(crate) fn store_field(&self, field: &FieldDescriptor, value: Value) {
        let mut fields = self.fields.lock();
        debug_assert!(field.index < fields.len());
        if let Some(slot) = fields.get_mut(field.index) {
            *slot = value;
        }
    }

    /// Attach the owning instance manager. Later attaches are ignored.
    pub fn attach_manager(&self, manager: &Arc<InstanceManager>) {
        let _ = self.manager.set(Arc::downgrade(manager));
    }

    /// The owning instance manager, if attached and still alive.
    pub fn manager(&self) -> Option<Arc<InstanceManager>> {
        self.manager.get().and_then(Weak::upgrade)
    }

    /// Whether this object's class is `name` or descends from it.
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.class.is_subclass_of(name)
    }
}

impl fmt::Debug for ManagedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedObject")
            .field("object_id", &self.object_id)
            .field("class", &self.class.name())
            .finish_non_exhaustive()
    }
}
