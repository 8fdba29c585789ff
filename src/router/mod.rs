pub mod config;
pub mod dispatch;
#[cfg(feature = "hyper")]
pub mod hyper;
pub mod pattern;

use crate::handler::{Handler, SharedHandler};
use crate::response::ResponseDefaults;
use crate::router::pattern::RoutePattern;
use std::sync::Arc;

/// One registered unit of dispatch.
///
/// The four kinds differ in how they match and what they consume:
/// - `Global` runs unconditionally on every request that reaches it.
/// - `Scoped` runs when its pattern matches a prefix of the remaining path;
///   the matched prefix is consumed and the handler sees the remainder.
/// - `Endpoint` runs only on an exact method match and an exact path match
///   (empty remainder); it owns an inner ordered handler chain executed as a
///   nested scope.
/// - `Mount` delegates to a nested router's full process list after consuming
///   a path prefix and rebasing.
pub enum Process {
    Global(SharedHandler),
    Scoped(RoutePattern, SharedHandler),
    Endpoint {
        method: String,
        pattern: RoutePattern,
        handlers: Vec<SharedHandler>,
    },
    Mount(RoutePattern, Router),
}

/// An ordered list of processes walked once per request.
///
/// Registration order is the externally visible match-priority contract: the
/// first registered process whose pattern matches wins, and the list is never
/// reordered. A router is built once at setup time and is read-only
/// afterwards, safe for unsynchronized concurrent reads across in-flight
/// requests.
pub struct Router {
    processes: Vec<Process>,
    defaults: ResponseDefaults,
}

impl Router {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            defaults: ResponseDefaults::new(),
        }
    }

    /// Replaces the default headers applied to fallback and error responses.
    pub fn with_defaults(mut self, defaults: ResponseDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Registers a global handler, invoked on every request that reaches it.
    pub fn handle(self, handler: impl Handler + 'static) -> Self {
        self.handle_shared(Arc::new(handler))
    }

    /// `handle` for an already-shared handler instance.
    pub fn handle_shared(mut self, handler: SharedHandler) -> Self {
        log::debug!("registered global handler '{}'", handler.name());
        self.processes.push(Process::Global(handler));
        self
    }

    /// Registers a handler scoped to a path prefix. The prefix is consumed
    /// before the handler runs; the handler sees only the remainder.
    pub fn scope(self, prefix: impl AsRef<str>, handler: impl Handler + 'static) -> Self {
        self.scope_shared(prefix, Arc::new(handler))
    }

    /// `scope` for an already-shared handler instance.
    pub fn scope_shared(mut self, prefix: impl AsRef<str>, handler: SharedHandler) -> Self {
        let pattern = RoutePattern::compile(prefix);
        log::debug!(
            "registered scoped handler '{}' at '{}'",
            handler.name(),
            pattern
        );
        self.processes.push(Process::Scoped(pattern, handler));
        self
    }

    /// Registers a method + exact-path endpoint with a single handler.
    pub fn route(
        self,
        method: impl AsRef<str>,
        path: impl AsRef<str>,
        handler: impl Handler + 'static,
    ) -> Self {
        self.route_chain(method, path, vec![Arc::new(handler) as SharedHandler])
    }

    /// Registers a method + exact-path endpoint whose handlers run as an
    /// inner ordered chain.
    pub fn route_chain(
        mut self,
        method: impl AsRef<str>,
        path: impl AsRef<str>,
        handlers: Vec<SharedHandler>,
    ) -> Self {
        let method = method.as_ref().to_uppercase();
        let pattern = RoutePattern::compile(path);
        log::debug!(
            "registered endpoint {}@{} with {} handler(s)",
            pattern,
            method,
            handlers.len()
        );
        self.processes.push(Process::Endpoint {
            method,
            pattern,
            handlers,
        });
        self
    }

    /// Mounts a fully-formed sub-router at a path prefix.
    ///
    /// The sub-router only ever sees the remainder of the path past the
    /// prefix; it would behave identically mounted at the top level with a
    /// correspondingly shorter incoming path.
    pub fn mount(mut self, prefix: impl AsRef<str>, router: Router) -> Self {
        let pattern = RoutePattern::compile(prefix);
        log::debug!(
            "mounted sub-router at '{}' with {} process(es)",
            pattern,
            router.processes.len()
        );
        self.processes.push(Process::Mount(pattern, router));
        self
    }

    pub(crate) fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub(crate) fn defaults(&self) -> &ResponseDefaults {
        &self.defaults
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
