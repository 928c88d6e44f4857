//! Interceptor chain registries and the class registry
//!
//! Interceptor registries map a key (field name, method id, or nothing for
//! constructors) to priority buckets of interceptors. Buckets are kept in
//! ascending numeric priority order; within one bucket, ordering equals
//! registration order.
//!
//! Dispatch never iterates a registry directly: it takes a snapshot, an
//! owned flat list built by walking the buckets in ascending priority
//! order and then reversing the result. After the reversal the highest
//! priority number sits at the head of the chain (outermost, dispatched
//! first) and the lowest priority number runs last, immediately before
//! the real operation. Later registrations never affect a snapshot
//! already handed out.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::class::ClassDescriptor;

/// Priority used by the no-priority registration overloads: the highest
/// value, i.e. the head of the dispatched chain, farthest from the real
/// operation.
pub const DEFAULT_PRIORITY: i32 = i32::MAX;

/// Priority used for handlers auto-registered on the constructor chain:
/// the lowest value, i.e. the tail of the dispatched chain, immediately
/// before the real operation.
pub const CORE_PRIORITY: i32 = i32::MIN;

/// Registry of interceptors keyed by member name.
pub(crate) struct KeyedRegistry<I: ?Sized> {
    inner: Mutex<FxHashMap<String, BTreeMap<i32, Vec<Arc<I>>>>>,
}

impl<I: ?Sized> KeyedRegistry<I> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(FxHashMap::default()),
        }
    }

    /// Append an interceptor to the priority bucket for `key`.
    pub(crate) fn register(&self, priority: i32, key: &str, interceptor: Arc<I>) {
        let mut inner = self.inner.lock();
        inner
            .entry(key.to_string())
            .or_default()
            .entry(priority)
            .or_default()
            .push(interceptor);
    }

    /// Build the dispatch chain for `key`: flatten ascending priority with
    /// insertion order inside each bucket, then reverse. The returned
    /// list is a copy.
    pub(crate) fn snapshot(&self, key: &str) -> Vec<Arc<I>> {
        let inner = self.inner.lock();
        let Some(buckets) = inner.get(key) else {
            return Vec::new();
        };
        let mut chain: Vec<Arc<I>> = buckets.values().flatten().cloned().collect();
        chain.reverse();
        chain
    }

    /// All registered keys.
    pub(crate) fn keys(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }
}

/// Registry of interceptors without a key (constructor interceptors).
pub(crate) struct GlobalRegistry<I: ?Sized> {
    inner: Mutex<BTreeMap<i32, Vec<Arc<I>>>>,
}

impl<I: ?Sized> GlobalRegistry<I> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    /// Append an interceptor to the priority bucket.
    pub(crate) fn register(&self, priority: i32, interceptor: Arc<I>) {
        self.inner.lock().entry(priority).or_default().push(interceptor);
    }

    /// Build the dispatch chain; same ordering rules as
    /// [`KeyedRegistry::snapshot`].
    pub(crate) fn snapshot(&self) -> Vec<Arc<I>> {
        let inner = self.inner.lock();
        let mut chain: Vec<Arc<I>> = inner.values().flatten().cloned().collect();
        chain.reverse();
        chain
    }
}

/// Registry resolving class descriptors by name.
///
/// Shared between component factories; resolution happens on the lazy
/// class-loading path of the instance manager.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: DashMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a class descriptor under its name.
    pub fn register(&self, class: Arc<ClassDescriptor>) {
        self.classes.insert(class.name().to_string(), class);
    }

    /// Resolve a class by name.
    pub fn get(&self, name: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(name).map(|entry| entry.value().clone())
    }

    /// Whether a class is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal interceptor-like payload; the registries only care about
    // ordering, not behavior.
    #[derive(Debug, PartialEq)]
    struct Tag(&'static str);

    fn tags(chain: &[Arc<Tag>]) -> Vec<&'static str> {
        chain.iter().map(|t| t.0).collect()
    }

    #[test]
    fn test_higher_priority_number_dispatches_first() {
        let registry: KeyedRegistry<Tag> = KeyedRegistry::new();
        registry.register(10, "x", Arc::new(Tag("a")));
        registry.register(5, "x", Arc::new(Tag("b")));

        // Ascending flatten gives [b, a]; the reversal makes priority 10
        // the chain head and priority 5 the innermost interceptor.
        assert_eq!(tags(&registry.snapshot("x")), vec!["a", "b"]);
    }

    #[test]
    fn test_ties_keep_bucket_order_before_reversal() {
        let registry: KeyedRegistry<Tag> = KeyedRegistry::new();
        registry.register(1, "x", Arc::new(Tag("first")));
        registry.register(1, "x", Arc::new(Tag("second")));
        registry.register(1, "x", Arc::new(Tag("third")));

        // The bucket holds registration order; the reversal flips it, so
        // the earliest registration ends up closest to the real operation.
        assert_eq!(
            tags(&registry.snapshot("x")),
            vec!["third", "second", "first"]
        );
    }

    #[test]
    fn test_core_priority_runs_innermost() {
        let registry: GlobalRegistry<Tag> = GlobalRegistry::new();
        registry.register(DEFAULT_PRIORITY, Arc::new(Tag("default")));
        registry.register(CORE_PRIORITY, Arc::new(Tag("core")));
        registry.register(0, Arc::new(Tag("middle")));

        // Handlers registered at CORE_PRIORITY are dispatched last,
        // immediately before the real operation.
        assert_eq!(
            tags(&registry.snapshot()),
            vec!["default", "middle", "core"]
        );
    }

    #[test]
    fn test_snapshot_isolation() {
        let registry: KeyedRegistry<Tag> = KeyedRegistry::new();
        registry.register(0, "x", Arc::new(Tag("a")));

        let snapshot = registry.snapshot("x");
        registry.register(0, "x", Arc::new(Tag("b")));

        // The earlier snapshot is a copy and does not see "b".
        assert_eq!(tags(&snapshot), vec!["a"]);
        assert_eq!(tags(&registry.snapshot("x")), vec!["b", "a"]);
    }

    #[test]
    fn test_unknown_key_gives_empty_chain() {
        let registry: KeyedRegistry<Tag> = KeyedRegistry::new();
        assert!(registry.snapshot("missing").is_empty());
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn test_class_registry() {
        let registry = ClassRegistry::new();
        assert!(registry.is_empty());

        let class = ClassDescriptor::builder("Point").build();
        registry.register(class);

        assert!(registry.contains("Point"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("Point").map(|c| c.name().to_string()),
            Some("Point".into())
        );
        assert!(registry.get("Missing").is_none());
    }
}
