use axum::{
    body::Body as AxumBody,
    http::{HeaderValue, Method, StatusCode, header},
};
use hyper::{Request, Response};

use crate::core::{ProxyDispatcher, RouteMatch, Router};

/// Liveness probe path, answered before routing.
pub const PING_PATH: &str = "/ping";

/// HTTP handler for the Gangway gateway.
///
/// Each request moves through `Received -> Matched -> Forwarding -> Relayed`,
/// `Received -> Matched -> Forwarding -> Failed(502)` or
/// `Received -> Unmatched -> 404`, writing exactly one response.
#[derive(Clone)]
pub struct HttpHandler {
    router: Router,
    dispatcher: ProxyDispatcher,
}

impl HttpHandler {
    pub fn new(router: Router, dispatcher: ProxyDispatcher) -> Self {
        Self { router, dispatcher }
    }

    /// Main request handler that routes requests appropriately
    pub async fn handle(&self, req: Request<AxumBody>) -> Response<AxumBody> {
        if req.method() == Method::GET && req.uri().path() == PING_PATH {
            return Self::handle_ping();
        }

        let route = match self.router.resolve(req.uri().path(), req.method()) {
            RouteMatch::Matched(route) => route,
            RouteMatch::NotFound => {
                tracing::debug!("No route for {} {}", req.method(), req.uri().path());
                return Self::not_found();
            }
        };

        tracing::debug!(
            "Matched {} to route '{}' -> {}",
            req.uri().path(),
            route.declared_path(),
            route.target()
        );

        self.dispatcher.forward(route, req).await
    }

    fn handle_ping() -> Response<AxumBody> {
        text_response(StatusCode::OK, "pong")
    }

    fn not_found() -> Response<AxumBody> {
        text_response(StatusCode::NOT_FOUND, "Not Found")
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<AxumBody> {
    let mut response = Response::new(AxumBody::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
