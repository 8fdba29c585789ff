use crate::response::Response;
use crate::router::Router;
use crate::state::RequestState;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::service::Service;
use hyper::{Request, StatusCode};
use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Context name under which the collected request body is stored, as
/// [`Bytes`]. Absent when the request carried no body.
pub const REQUEST_BODY: &str = "request.body";

/// A hyper [`Service`] that dispatches every connection's requests through a
/// shared router.
#[derive(Clone)]
pub struct RouterService {
    router: Arc<Router>,
}

impl RouterService {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }
}

impl<B> Service<Request<B>> for RouterService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Display,
{
    type Response = hyper::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, request: Request<B>) -> Self::Future {
        let router = self.router.clone();
        Box::pin(async move {
            let response = match state_from_request(request).await {
                Ok(state) => router.dispatch(state).await,
                Err(rejected) => rejected,
            };
            Ok(into_hyper_response(response))
        })
    }
}

/// Builds the per-request state from an inbound hyper request.
///
/// The query string and `Cookie` header are parsed into the state's maps,
/// header values that are not valid UTF-8 are dropped, and the body is
/// collected up front and stored in the context under [`REQUEST_BODY`].
/// A body read failure is rejected with a client-error response.
pub async fn state_from_request<B>(request: Request<B>) -> Result<RequestState, Response>
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = request.into_parts();
    let mut state = RequestState::new(parts.method.as_str(), parts.uri.path());

    if let Some(query) = parts.uri.query() {
        for pair in query.split('&').filter(|pair| !pair.is_empty()) {
            match pair.split_once('=') {
                Some((name, value)) => state = state.with_query(name, value),
                None => state = state.with_query(pair, ""),
            }
        }
    }

    for (name, value) in parts.headers.iter() {
        if let Ok(value) = value.to_str() {
            state = state.with_header(name.as_str(), value);
        }
    }

    if let Some(cookies) = parts
        .headers
        .get(hyper::header::COOKIE)
        .and_then(|value| value.to_str().ok())
    {
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.split_once('=') {
                state = state.with_cookie(name.trim(), value.trim());
            }
        }
    }

    match body.collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            if !bytes.is_empty() {
                state = state.with_context_value(REQUEST_BODY, bytes);
            }
            Ok(state)
        }
        Err(err) => {
            log::debug!("failed to collect request body: {}", err);
            Err(Response::text(400, "failed to read request body"))
        }
    }
}

/// Converts a terminal [`Response`] into the hyper representation.
pub fn into_hyper_response(response: Response) -> hyper::Response<Full<Bytes>> {
    let status =
        StatusCode::from_u16(response.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = hyper::Response::builder().status(status);
    for (name, value) in response.headers() {
        builder = builder.header(name.as_str(), value.as_str());
    }
    match builder.body(Full::new(Bytes::from(response.into_body()))) {
        Ok(built) => built,
        Err(err) => {
            log::error!("failed to build hyper response: {}", err);
            let mut fallback =
                hyper::Response::new(Full::new(Bytes::from_static(b"internal server error")));
            *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Flow;
    use crate::handler::HandlerFn;

    fn request(method: &str, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("x-api-key", "secret")
            .header("cookie", "session=abc; theme=dark")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    #[tokio::test]
    async fn test_state_from_request_parses_everything() {
        let state = state_from_request(request("POST", "/users/7?page=2&all", "payload"))
            .await
            .unwrap();

        assert_eq!(state.method(), "POST");
        assert_eq!(state.path(), "/users/7");
        assert_eq!(state.query("page"), Some("2"));
        assert_eq!(state.query("all"), Some(""));
        assert_eq!(state.header("X-Api-Key"), Some("secret"));
        assert_eq!(state.cookie("session"), Some("abc"));
        assert_eq!(state.cookie("theme"), Some("dark"));
        assert_eq!(
            state.context().get::<Bytes>(REQUEST_BODY),
            Some(&Bytes::from_static(b"payload"))
        );
    }

    #[tokio::test]
    async fn test_empty_body_leaves_context_untouched() {
        let state = state_from_request(request("GET", "/ping", "")).await.unwrap();
        assert!(!state.context().contains::<Bytes>(REQUEST_BODY));
    }

    #[tokio::test]
    async fn test_into_hyper_response_carries_everything() {
        let converted = into_hyper_response(Response::text(201, "done").set_header("x-tag", "a"));
        assert_eq!(converted.status(), StatusCode::CREATED);
        assert_eq!(converted.headers().get("x-tag").unwrap(), "a");
        let body = converted.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"done");
    }

    #[tokio::test]
    async fn test_service_end_to_end() {
        let router = Router::new().route(
            "GET",
            "/users/:id",
            HandlerFn::new("get_user", |state: RequestState| async move {
                let id = state.param("id").unwrap_or("").to_string();
                Flow::Complete(Response::text(200, id))
            }),
        );
        let service = RouterService::new(Arc::new(router));

        let response = service.call(request("GET", "/users/42", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"42");
    }
}
