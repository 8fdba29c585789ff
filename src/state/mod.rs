pub mod context;

use crate::response::Response;
use fnv::FnvBuildHasher;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub use context::Context;

type ParamMap = HashMap<String, String, FnvBuildHasher>;

/// A deferred response-transform step accumulated on the request state.
///
/// Finalizers run after a terminal response exists; each receives the state
/// active at completion plus the response produced by the previous step, and
/// returns the (possibly modified) response for the next one. A finalizer can
/// reshape the response but never reopens the dispatch.
pub type Finalizer =
    Arc<dyn Fn(&RequestState, Response) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps a closure as a [`Finalizer`].
pub fn finalizer<F>(f: F) -> Finalizer
where
    F: Fn(&RequestState, Response) -> BoxFuture<'static, Response> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// The immutable per-request value threaded through a dispatch.
///
/// A `RequestState` is created exactly once per inbound request and every
/// transformation produces a new value; nothing here is ever mutated in place
/// or shared between concurrent requests. The `path` only ever changes by
/// prefix removal when a scope consumes it, and `base_path` accumulates what
/// was consumed so the full original path can always be reconstructed.
#[derive(Clone)]
pub struct RequestState {
    method: String,
    path: String,
    params: ParamMap,
    query: ParamMap,
    headers: ParamMap,
    cookies: ParamMap,
    context: Context,
    finalizers: Vec<Finalizer>,
    base_path: String,
    id: Uuid,
}

impl std::fmt::Debug for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestState")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("base_path", &self.base_path)
            .field("params", &self.params)
            .field("finalizers", &self.finalizers.len())
            .field("id", &self.id)
            .finish()
    }
}

impl RequestState {
    /// Creates the state for a new inbound request.
    ///
    /// The method is normalized to uppercase; the path is kept as received.
    pub fn new(method: impl AsRef<str>, path: impl Into<String>) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            path: path.into(),
            params: ParamMap::default(),
            query: ParamMap::default(),
            headers: ParamMap::default(),
            cookies: ParamMap::default(),
            context: Context::new(),
            finalizers: Vec::new(),
            base_path: String::new(),
            id: Uuid::new_v4(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The path still unconsumed by enclosing scopes.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The prefix already consumed by outer mount points and scopes.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Header lookup; names are stored lowercased.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn finalizers(&self) -> &[Finalizer] {
        &self.finalizers
    }

    /// The non-empty segments of the remaining path, in order.
    pub fn path_segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Returns a new state with this path parameter bound.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Returns a new state with all of `bound` merged in. A name bound here
    /// overwrites an identically named outer binding.
    pub fn with_params(mut self, bound: ParamMap) -> Self {
        self.params.extend(bound);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_lowercase(), value.into());
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Returns a new state with a typed value stored in the context map.
    pub fn with_context_value<T>(mut self, name: impl AsRef<str>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.context.insert(name, value);
        self
    }

    /// Returns a new state with `f` prepended to the finalizer list, so the
    /// most recently added finalizer runs first once a response exists.
    pub fn with_finalizer(mut self, f: Finalizer) -> Self {
        self.finalizers.insert(0, f);
        self
    }

    /// Enters a nested scope: merges the newly bound params, replaces the
    /// path with the unmatched remainder, and extends `base_path` with the
    /// actual segments the scope consumed.
    pub(crate) fn descend(&self, bound: ParamMap, consumed: &[&str], remainder: &[&str]) -> Self {
        let mut next = self.clone();
        next.params.extend(bound);
        next.path = join_segments(remainder);
        if !consumed.is_empty() {
            next.base_path.push('/');
            next.base_path.push_str(&consumed.join("/"));
        }
        next
    }

    /// Applies the accumulated finalizers to a terminal response, one at a
    /// time in list order (most recently added first).
    pub async fn apply_finalizers(&self, response: Response) -> Response {
        let mut response = response;
        for step in &self.finalizers {
            response = step(self, response).await;
        }
        response
    }
}

fn join_segments(segments: &[&str]) -> String {
    if segments.is_empty() {
        String::from("/")
    } else {
        let mut path = String::new();
        for segment in segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }
}
