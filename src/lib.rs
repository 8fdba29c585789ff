//! Trellis is a request-routing and middleware-composition engine.
//!
//! A [`Router`](router::Router) holds an ordered list of processes — global
//! handlers, path-scoped handlers, method endpoints, and mounted sub-routers —
//! walked once per request in registration order. Handlers cooperate through
//! the four-case [`Flow`](flow::Flow) algebra to continue, decline, complete,
//! or fail; failures stay pending and are offered to later processes for
//! recovery before a default error response is produced. Response finalizers
//! accumulated on the immutable [`RequestState`](state::RequestState) run in
//! reverse registration order once a terminal response exists.
//!
//! The network listener, body codecs, and concrete middleware (auth,
//! compression, rate limits) live outside this crate; they participate by
//! implementing [`Handler`](handler::Handler). An optional `hyper` feature
//! provides the service glue for hyper servers.

pub mod error;
pub mod flow;
pub mod handler;
pub mod response;
pub mod router;
pub mod state;

pub use crate::error::{ErrorKind, RouteError};
pub use crate::flow::Flow;
pub use crate::handler::{Handler, HandlerFn, SharedHandler};
pub use crate::response::{Response, ResponseDefaults, SetCookie};
pub use crate::router::Router;
pub use crate::state::{Context, Finalizer, RequestState};
