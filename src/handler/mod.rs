pub mod registry;

use crate::error::RouteError;
use crate::flow::Flow;
use crate::response::Response;
use crate::state::RequestState;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

pub type SharedHandler = Arc<dyn Handler>;

/// One unit of request processing.
///
/// This is the only contract external collaborators (auth, compression,
/// static files, rate limiting, CORS, cookies) must satisfy to participate
/// in dispatch.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Processes the request state and reports how dispatch should proceed.
    async fn handle(&self, state: RequestState) -> Flow;

    /// Offered a pending error carried past this process.
    ///
    /// Invoked instead of [`handle`](Handler::handle) while an error is
    /// pending. Returning a response converts the error and ends the
    /// dispatch; returning `None` leaves it pending for later processes.
    /// Handlers that do not recognize the error's kind should decline.
    async fn recover(&self, _state: &RequestState, _error: &RouteError) -> Option<Response> {
        None
    }

    fn name(&self) -> &str;
}

/// Adapts a plain async closure into a [`Handler`].
pub struct HandlerFn<F, Fut> {
    name: String,
    func: F,
    _marker: PhantomData<fn() -> Fut>,
}

impl<F, Fut> HandlerFn<F, Fut>
where
    F: Fn(RequestState) -> Fut + Send + Sync,
    Fut: Future<Output = Flow> + Send + 'static,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _marker: PhantomData,
        }
    }

    /// Convenience for registration sites that want the shared form directly.
    pub fn shared(name: impl Into<String>, func: F) -> SharedHandler
    where
        F: 'static,
    {
        Arc::new(Self::new(name, func))
    }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F, Fut>
where
    F: Fn(RequestState) -> Fut + Send + Sync,
    Fut: Future<Output = Flow> + Send + 'static,
{
    async fn handle(&self, state: RequestState) -> Flow {
        (self.func)(state).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_fn_adapts_closures() {
        let handler = HandlerFn::new("echo_path", |state: RequestState| async move {
            Flow::Complete(Response::text(200, state.path().to_string()))
        });

        let flow = handler.handle(RequestState::new("GET", "/ping")).await;
        match flow {
            Flow::Complete(response) => assert_eq!(response.body(), b"/ping"),
            other => panic!("expected Complete, got {:?}", other),
        }
        assert_eq!(handler.name(), "echo_path");
    }

    #[tokio::test]
    async fn test_default_recovery_declines() {
        let handler = HandlerFn::new("noop", |_state: RequestState| async move { Flow::Skip });
        let state = RequestState::new("GET", "/");
        let offered = handler.recover(&state, &RouteError::validation("bad")).await;
        assert!(offered.is_none());
    }
}
