use crate::error::RouteError;
use crate::flow::Flow;
use crate::handler::SharedHandler;
use crate::response::{Response, reason_phrase};
use crate::router::{Process, Router};
use crate::state::RequestState;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// How one walk of a process list ended.
///
/// `Complete` carries the state that was active at the completion point, so
/// the finalizers accumulated on it can run exactly once at the top of the
/// dispatch. `Failed` is an exhausted list with the error still pending;
/// `NoMatch` is an exhausted list with nothing terminal, remembering whether
/// some exact path match was turned away only because of its method.
pub(crate) enum WalkEnd {
    Complete {
        response: Response,
        state: RequestState,
    },
    Failed {
        error: RouteError,
    },
    NoMatch {
        method_mismatch: bool,
    },
}

/// How an endpoint's inner handler chain ended, reported upward as the
/// endpoint's own result: `Exhausted` counts as a skip, `Failed` escapes to
/// the enclosing list as a pending error.
enum ChainEnd {
    Complete {
        response: Response,
        state: RequestState,
    },
    Failed(RouteError),
    Exhausted,
}

impl Router {
    /// Dispatches one request through the process list and produces the
    /// terminal response.
    ///
    /// The walk threads the state forward in registration order, recursing
    /// into endpoint chains and mounted sub-routers. Once a completion
    /// exists, the finalizers of the state active at that point run, most
    /// recently added first. An exhausted list falls back to a default
    /// response: not-found, method-not-allowed, or the pending error's own
    /// rendering.
    pub async fn dispatch(&self, state: RequestState) -> Response {
        log::trace!(
            "dispatching {}@{} [{}]",
            state.path(),
            state.method(),
            state.id()
        );
        match self.walk(state).await {
            WalkEnd::Complete { response, state } => state.apply_finalizers(response).await,
            WalkEnd::Failed { error } => {
                log::debug!("dispatch exhausted with unrecovered error: {}", error);
                error.into_response(self.defaults())
            }
            WalkEnd::NoMatch { method_mismatch } => {
                // A matched path with a rejected method selects 405; a path
                // nothing matched (or that every process declined) is 404.
                let status = if method_mismatch { 405 } else { 404 };
                log::debug!("dispatch exhausted without a match, replying {}", status);
                self.defaults()
                    .apply(Response::text(status, reason_phrase(status)))
            }
        }
    }

    /// Walks this router's process list once, carrying the request state and
    /// any pending error. Boxed because mounted sub-routers recurse.
    pub(crate) fn walk(&self, state: RequestState) -> BoxFuture<'_, WalkEnd> {
        async move {
            let mut state = state;
            let mut pending: Option<RouteError> = None;
            let mut method_mismatch = false;

            for process in self.processes() {
                // While an error is pending, processes are offered the error
                // for recovery instead of being matched and invoked.
                if let Some(error) = pending.as_ref() {
                    if let Some(response) = offer_recovery(process, &state, error).await {
                        log::trace!("pending error recovered [{}]", state.id());
                        return WalkEnd::Complete { response, state };
                    }
                    continue;
                }

                match process {
                    Process::Global(handler) => {
                        match handler.handle(state.clone()).await {
                            Flow::Continue(next) => state = next,
                            Flow::Skip => {}
                            Flow::Complete(response) => {
                                return WalkEnd::Complete { response, state };
                            }
                            Flow::Fail(error) => pending = Some(error),
                        }
                    }
                    Process::Scoped(pattern, handler) => {
                        let scoped = {
                            let segments = state.path_segments();
                            pattern
                                .matches(&segments)
                                .map(|m| state.descend(m.params, &m.consumed, &m.remainder))
                        };
                        if let Some(scoped) = scoped {
                            match handler.handle(scoped.clone()).await {
                                Flow::Continue(next) => state = next,
                                Flow::Skip => {}
                                Flow::Complete(response) => {
                                    return WalkEnd::Complete {
                                        response,
                                        state: scoped,
                                    };
                                }
                                Flow::Fail(error) => pending = Some(error),
                            }
                        }
                    }
                    Process::Endpoint {
                        method,
                        pattern,
                        handlers,
                    } => {
                        let exact = {
                            let segments = state.path_segments();
                            pattern
                                .matches(&segments)
                                .filter(|m| m.is_exact())
                                .map(|m| m.params)
                        };
                        let Some(bound) = exact else {
                            continue;
                        };
                        if method.as_str() != state.method() {
                            method_mismatch = true;
                            continue;
                        }
                        let scoped = state.clone().with_params(bound);
                        match run_chain(handlers, scoped).await {
                            ChainEnd::Complete { response, state } => {
                                return WalkEnd::Complete { response, state };
                            }
                            ChainEnd::Failed(error) => pending = Some(error),
                            ChainEnd::Exhausted => {}
                        }
                    }
                    Process::Mount(pattern, router) => {
                        let rebased = {
                            let segments = state.path_segments();
                            pattern
                                .matches(&segments)
                                .map(|m| state.descend(m.params, &m.consumed, &m.remainder))
                        };
                        if let Some(rebased) = rebased {
                            match router.walk(rebased).await {
                                WalkEnd::Complete { response, state } => {
                                    return WalkEnd::Complete { response, state };
                                }
                                // Unrecovered sub-router errors escape here so
                                // processes after the mount point still get a
                                // chance to recover them.
                                WalkEnd::Failed { error } => pending = Some(error),
                                WalkEnd::NoMatch {
                                    method_mismatch: nested,
                                } => method_mismatch |= nested,
                            }
                        }
                    }
                }
            }

            match pending {
                Some(error) => WalkEnd::Failed { error },
                None => WalkEnd::NoMatch { method_mismatch },
            }
        }
        .boxed()
    }
}

/// Offers a pending error to a process for recovery.
///
/// Mounted routers are never offered a parent scope's pending error: recovery
/// runs through the remainder of the scope the error arose in, then through
/// enclosing scopes if it escapes.
async fn offer_recovery(
    process: &Process,
    state: &RequestState,
    error: &RouteError,
) -> Option<Response> {
    match process {
        Process::Global(handler) | Process::Scoped(_, handler) => {
            handler.recover(state, error).await
        }
        Process::Endpoint { handlers, .. } => {
            for handler in handlers {
                if let Some(response) = handler.recover(state, error).await {
                    return Some(response);
                }
            }
            None
        }
        Process::Mount(..) => None,
    }
}

/// Runs an endpoint's inner handler list with its own local bookkeeping.
async fn run_chain(handlers: &[SharedHandler], state: RequestState) -> ChainEnd {
    let mut state = state;
    let mut pending: Option<RouteError> = None;
    for handler in handlers {
        if let Some(error) = pending.as_ref() {
            if let Some(response) = handler.recover(&state, error).await {
                return ChainEnd::Complete { response, state };
            }
            continue;
        }
        match handler.handle(state.clone()).await {
            Flow::Continue(next) => state = next,
            Flow::Skip => {}
            Flow::Complete(response) => return ChainEnd::Complete { response, state },
            Flow::Fail(error) => pending = Some(error),
        }
    }
    match pending {
        Some(error) => ChainEnd::Failed(error),
        None => ChainEnd::Exhausted,
    }
}
