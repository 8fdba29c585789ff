use crate::handler::{Handler, SharedHandler};
use dashmap::{DashMap, Entry};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Identifier a handler is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HandlerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during handler registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Indicates that a handler with the specified ID could not be found in the registry.
    #[error("Handler with id '{handler_id}' not found.")]
    MissingHandler { handler_id: HandlerId },

    /// Indicates that registration failed due to a handler ID conflict.
    #[error("Handler with id '{handler_id}' already exists.")]
    ConflictingHandlerId { handler_id: HandlerId },
}

impl RegistryError {
    #[inline]
    pub(crate) const fn missing_handler(id: HandlerId) -> Self {
        Self::MissingHandler { handler_id: id }
    }

    #[inline]
    pub(crate) const fn conflicting_handler_id(id: HandlerId) -> Self {
        Self::ConflictingHandlerId { handler_id: id }
    }
}

/// A thread-safe registry of named shared handlers.
///
/// Populated once at setup time and read concurrently afterwards; the
/// configuration layer resolves route definitions against it by name.
pub struct HandlerRegistry {
    handlers: DashMap<HandlerId, SharedHandler, fnv::FnvBuildHasher>,
}

impl HandlerRegistry {
    /// Creates a new empty handler registry.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::with_hasher(fnv::FnvBuildHasher::default()),
        }
    }

    /// Retrieves a handler from the registry by its identifier.
    pub fn find_with_id(&self, id: &HandlerId) -> Result<SharedHandler, RegistryError> {
        match self.handlers.get(id) {
            None => Err(RegistryError::missing_handler(id.clone())),
            Some(handler) => Ok(handler.value().clone()),
        }
    }

    /// Registers a new handler in the registry with the specified identifier.
    pub fn register_handler(
        &mut self,
        handler_id: HandlerId,
        handler: impl Handler + 'static,
    ) -> Result<(), RegistryError> {
        match self.handlers.entry(handler_id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::conflicting_handler_id(handler_id)),
            Entry::Vacant(entry) => {
                entry.insert(std::sync::Arc::new(handler));
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Flow;
    use crate::state::RequestState;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct TestHandler {
        name: String,
    }

    impl TestHandler {
        fn new(name: impl Into<String>) -> Self {
            Self { name: name.into() }
        }
    }

    #[async_trait]
    impl Handler for TestHandler {
        async fn handle(&self, _state: RequestState) -> Flow {
            Flow::Skip
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_register_multiple_handlers_success() {
        let mut registry = HandlerRegistry::new();

        let result1 =
            registry.register_handler(HandlerId::new("handler_1"), TestHandler::new("handler_1"));
        let result2 =
            registry.register_handler(HandlerId::new("handler_2"), TestHandler::new("handler_2"));

        assert!(result1.is_ok());
        assert!(result2.is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_handler_with_conflicting_id() {
        let mut registry = HandlerRegistry::new();
        let handler_id = HandlerId::new("duplicate_handler");

        let result1 = registry.register_handler(handler_id.clone(), TestHandler::new("first"));
        assert!(result1.is_ok());

        let result2 = registry.register_handler(handler_id.clone(), TestHandler::new("second"));
        assert!(result2.is_err());

        // Registry should still contain only the first handler
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.find_with_id(&handler_id).unwrap().name(),
            "first"
        );
    }

    #[test]
    fn test_find_nonexistent_handler() {
        let registry = HandlerRegistry::new();
        let result = registry.find_with_id(&HandlerId::new("nonexistent_handler"));
        assert!(result.is_err());
    }

    #[test]
    fn test_handler_registry_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let mut registry = HandlerRegistry::new();
        for i in 0..5 {
            registry
                .register_handler(
                    HandlerId::new(format!("handler_{}", i)),
                    TestHandler::new(format!("handler_{}", i)),
                )
                .unwrap();
        }

        let registry = Arc::new(registry);
        let mut handles = vec![];
        for i in 0..5 {
            let registry_clone = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                let handler_id = HandlerId::new(format!("handler_{}", i));
                registry_clone
                    .find_with_id(&handler_id)
                    .unwrap()
                    .name()
                    .to_string()
            }));
        }

        let mut results = vec![];
        for handle in handles {
            results.push(handle.join().unwrap());
        }
        assert_eq!(results.len(), 5);
        for i in 0..5 {
            assert!(results.contains(&format!("handler_{}", i)));
        }
    }
}
