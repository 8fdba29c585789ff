use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use trellis::error::{ErrorKind, RouteError};
use trellis::flow::Flow;
use trellis::handler::{Handler, HandlerFn};
use trellis::response::{Response, ResponseDefaults};
use trellis::router::Router;
use trellis::router::hyper::RouterService;
use trellis::state::{RequestState, finalizer};

/// Rejects requests without the demo API key; later processes convert the
/// pending error into a response.
struct ApiKeyGate;

#[async_trait::async_trait]
impl Handler for ApiKeyGate {
    async fn handle(&self, state: RequestState) -> Flow {
        match state.header("x-api-key") {
            Some("letmein") => Flow::Continue(state),
            _ => Flow::Fail(RouteError::unauthorized("missing or invalid api key")),
        }
    }

    fn name(&self) -> &str {
        "api_key_gate"
    }
}

/// Converts unauthorized errors into a friendly JSON reply.
struct AuthRecoverer;

#[async_trait::async_trait]
impl Handler for AuthRecoverer {
    async fn handle(&self, _state: RequestState) -> Flow {
        Flow::Skip
    }

    async fn recover(&self, _state: &RequestState, error: &RouteError) -> Option<Response> {
        if error.kind() == ErrorKind::Unauthorized {
            let payload = json!({"error": "unauthorized", "hint": "send x-api-key: letmein"});
            Some(Response::json_value(401, &payload))
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "auth_recoverer"
    }
}

fn build_router() -> Router {
    let secure = Router::new()
        .handle(ApiKeyGate)
        .handle(AuthRecoverer)
        .route(
            "GET",
            "/profile",
            HandlerFn::new("profile", |_| async move {
                Flow::Complete(Response::json_value(200, &json!({"user": "demo"})))
            }),
        );

    let api = Router::new()
        .route(
            "GET",
            "/health",
            HandlerFn::new("health", |_| async move {
                Flow::Complete(Response::text(200, "healthy"))
            }),
        )
        .mount("/secure", secure);

    Router::new()
        .with_defaults(ResponseDefaults::new().with_header("server", "trellis-demo"))
        .handle(HandlerFn::new("request_id", |state: RequestState| async move {
            let next = state.with_finalizer(finalizer(|state, response| {
                let id = state.id().to_string();
                Box::pin(async move { response.set_header("x-request-id", id) })
            }));
            Flow::Continue(next)
        }))
        .route(
            "GET",
            "/users/:id",
            HandlerFn::new("get_user", |state: RequestState| async move {
                let payload = json!({"id": state.param("id")});
                Flow::Complete(Response::json_value(200, &payload))
            }),
        )
        .mount("/api", api)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let service = RouterService::new(Arc::new(build_router()));
    let addr = SocketAddr::from(([127, 0, 0, 1], 8080));
    let listener = TcpListener::bind(addr).await?;
    println!("listening on http://{}", addr);
    println!("try:");
    println!("  curl http://{}/users/7", addr);
    println!("  curl http://{}/api/health", addr);
    println!("  curl http://{}/api/secure/profile", addr);
    println!("  curl -H 'x-api-key: letmein' http://{}/api/secure/profile", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let service = service.clone();
        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                eprintln!("connection error: {}", err);
            }
        });
    }
}
