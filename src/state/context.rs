use fnv::FnvBuildHasher;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Composite key for context entries.
///
/// The key pairs the caller-supplied name with the stored value's `TypeId`,
/// so the same name may hold values of different types side by side and a
/// lookup only ever sees a value of the type it asked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContextKey {
    name: String,
    type_id: TypeId,
}

impl ContextKey {
    fn new(name: impl AsRef<str>, type_id: TypeId) -> Self {
        Self {
            name: name.as_ref().to_string(),
            type_id,
        }
    }
}

/// A typed per-request capability map.
///
/// Middleware use this to pass data forward through the chain (an
/// authenticated principal, a parsed body, a trace tag). Lookups are checked:
/// `get::<T>` returns `None` unless an entry with the same name *and* type
/// exists, so a mismatched read can never observe a value as the wrong type.
///
/// Values are stored behind `Arc`, which keeps the containing request state
/// cheap to clone as it threads through the dispatch.
#[derive(Clone, Default)]
pub struct Context {
    entries: HashMap<ContextKey, Arc<dyn Any + Send + Sync>, FnvBuildHasher>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl Context {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(FnvBuildHasher::default()),
        }
    }

    /// Stores a typed value under the given name.
    ///
    /// # Behavior
    /// A previous value with the same name and type is replaced. A value with
    /// the same name but a different type is left untouched.
    pub fn insert<T>(&mut self, name: impl AsRef<str>, value: T)
    where
        T: Send + Sync + 'static,
    {
        let key = ContextKey::new(name, TypeId::of::<T>());
        self.entries.insert(key, Arc::new(value));
    }

    /// Retrieves a reference to a typed value.
    ///
    /// # Returns
    /// `Some(&T)` if an entry with this name and exactly this type exists,
    /// `None` otherwise.
    pub fn get<T>(&self, name: impl AsRef<str>) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        let key = ContextKey::new(name, TypeId::of::<T>());
        self.entries
            .get(&key)
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Removes the entry with this name and type, returning whether one existed.
    pub fn remove<T>(&mut self, name: impl AsRef<str>) -> bool
    where
        T: Send + Sync + 'static,
    {
        let key = ContextKey::new(name, TypeId::of::<T>());
        self.entries.remove(&key).is_some()
    }

    /// Returns `true` if an entry with this name and type exists.
    pub fn contains<T>(&self, name: impl AsRef<str>) -> bool
    where
        T: Send + Sync + 'static,
    {
        let key = ContextKey::new(name, TypeId::of::<T>());
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
