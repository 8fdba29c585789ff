use crate::handler::SharedHandler;
use crate::handler::registry::{HandlerId, HandlerRegistry, RegistryError};
use crate::router::Router;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur while resolving a router configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Chain '{name}' is not defined.")]
    UnknownChain { name: String },

    #[error("Route '{path}' resolves to an empty handler chain.")]
    EmptyRoute { path: String },

    #[error("Failed to resolve handler.")]
    Registry {
        #[source]
        source: RegistryError,
    },
}

impl ConfigError {
    #[inline]
    pub(crate) fn unknown_chain(name: impl Into<String>) -> Self {
        Self::UnknownChain { name: name.into() }
    }

    #[inline]
    pub(crate) fn empty_route(path: impl Into<String>) -> Self {
        Self::EmptyRoute { path: path.into() }
    }

    #[inline]
    pub(crate) const fn registry_error(source: RegistryError) -> Self {
        Self::Registry { source }
    }
}

/// One process declaration in a configuration file.
///
/// Declaration order is registration order, which is the match-priority
/// contract; the list is applied exactly as written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessConfig {
    /// A global handler, referenced by registry name.
    Global { handler: String },

    /// A prefix-scoped handler, referenced by registry name.
    Scope { prefix: String, handler: String },

    /// A method + exact-path endpoint. Entries in `handlers` are registry
    /// names, or `@chain` references expanded in place.
    Route {
        method: String,
        path: String,
        handlers: Vec<String>,
    },

    /// A nested router mounted at a prefix.
    Mount { prefix: String, router: RouterConfig },
}

/// A declarative router description resolved against a [`HandlerRegistry`].
///
/// `chains` are reusable named handler lists; a route handler entry of the
/// form `@name` expands to the chain's members in order. Chains hold plain
/// handler names only and are local to their own router (a mounted router
/// brings its own `chains` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub chains: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub processes: Vec<ProcessConfig>,
}

impl RouterConfig {
    /// Resolves every named handler and builds the router, preserving
    /// declaration order.
    pub fn build(&self, registry: &HandlerRegistry) -> Result<Router, ConfigError> {
        log::info!(
            "building router from configuration with {} process(es)",
            self.processes.len()
        );
        let mut router = Router::new();
        for process in &self.processes {
            router = match process {
                ProcessConfig::Global { handler } => {
                    router.handle_shared(self.find(registry, handler)?)
                }
                ProcessConfig::Scope { prefix, handler } => {
                    router.scope_shared(prefix, self.find(registry, handler)?)
                }
                ProcessConfig::Route {
                    method,
                    path,
                    handlers,
                } => {
                    let resolved = self.resolve_chain(registry, handlers)?;
                    if resolved.is_empty() {
                        return Err(ConfigError::empty_route(path));
                    }
                    router.route_chain(method, path, resolved)
                }
                ProcessConfig::Mount { prefix, router: nested } => {
                    router.mount(prefix, nested.build(registry)?)
                }
            };
        }
        Ok(router)
    }

    /// Expands `@chain` references and resolves every name to a handler.
    fn resolve_chain(
        &self,
        registry: &HandlerRegistry,
        names: &[String],
    ) -> Result<Vec<SharedHandler>, ConfigError> {
        let mut handlers = Vec::new();
        for name in names {
            match name.strip_prefix('@') {
                Some(chain) => {
                    let members = self
                        .chains
                        .get(chain)
                        .ok_or_else(|| ConfigError::unknown_chain(chain))?;
                    for member in members {
                        handlers.push(self.find(registry, member)?);
                    }
                }
                None => handlers.push(self.find(registry, name)?),
            }
        }
        Ok(handlers)
    }

    fn find(
        &self,
        registry: &HandlerRegistry,
        name: &str,
    ) -> Result<SharedHandler, ConfigError> {
        registry
            .find_with_id(&HandlerId::new(name))
            .map_err(ConfigError::registry_error)
    }
}
