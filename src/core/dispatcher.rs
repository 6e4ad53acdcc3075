//! Per-request forwarding.
//!
//! [`ProxyDispatcher`] turns an inbound request plus its matched [`Route`]
//! into exactly one outbound request, sends it through the [`HttpClient`]
//! port under a fixed timeout and relays the backend's response. Bodies are
//! streamed in both directions; nothing is buffered here.
//!
//! Rewriting is limited to connection-level attributes:
//! * scheme and authority come from the route target
//! * `Host` is set to the target authority
//! * hop-by-hop headers are dropped in both directions
//! * the outbound version is HTTP/1.1
//!
//! The path and query are forwarded exactly as received, including any
//! prefix that was used for matching.
//!
//! The request timeout bounds the wait for response headers. After that both
//! bodies are wrapped in an idle timeout of the same length, so a peer that
//! stops sending mid-body aborts the exchange instead of holding it open.
use std::{sync::Arc, time::Duration};

use axum::body::{Body as AxumBody, HttpBody};
use http::{
    HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode, Uri, Version, header,
    uri::PathAndQuery,
};
use tokio::time::timeout;
use tower_http::timeout::TimeoutBody;
use tracing::Instrument;

use crate::{
    core::{backend::BackendTarget, route_table::Route},
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult},
    tracing_setup::create_backend_span,
};

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const BAD_GATEWAY_BODY: &str = "Bad Gateway";

/// Builds, sends and relays proxied traffic. Holds no per-request state, so a
/// single instance is shared by every concurrent request.
#[derive(Clone)]
pub struct ProxyDispatcher {
    client: Arc<dyn HttpClient>,
    request_timeout: Duration,
}

impl ProxyDispatcher {
    pub fn new(client: Arc<dyn HttpClient>, request_timeout: Duration) -> Self {
        Self {
            client,
            request_timeout,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Forward `req` to the route's backend and return the response to send
    /// back to the client. Backend failures and timeouts become a 502.
    pub async fn forward(&self, route: &Route, req: Request<AxumBody>) -> Response<AxumBody> {
        let target = route.target();
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let span = create_backend_span(&target.to_string(), &method, &path);

        async move {
            let outbound = match build_outbound_request(target, req) {
                Ok(outbound) => {
                    outbound.map(|body| with_idle_timeout(body, self.request_timeout))
                }
                Err(e) => {
                    tracing::error!("Failed to build outbound request: {}", e);
                    return bad_gateway();
                }
            };

            match self.send(outbound).await {
                Ok(response) => {
                    tracing::Span::current().record("http.status_code", response.status().as_u16());
                    relay_response(response, self.request_timeout)
                }
                Err(e) => {
                    tracing::Span::current()
                        .record("http.status_code", StatusCode::BAD_GATEWAY.as_u16());
                    match e {
                        HttpClientError::Timeout(_) => {
                            tracing::warn!("Backend {} timed out: {}", target, e)
                        }
                        _ if e.is_backend_unavailable() => {
                            tracing::error!("Backend {} unavailable: {}", target, e)
                        }
                        _ => tracing::error!("Could not send request to {}: {}", target, e),
                    }
                    bad_gateway()
                }
            }
        }
        .instrument(span)
        .await
    }

    /// One outbound attempt, bounded by the request timeout. No retries.
    pub async fn send(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>> {
        match timeout(self.request_timeout, self.client.send_request(req)).await {
            Ok(result) => result,
            Err(_) => Err(HttpClientError::Timeout(self.request_timeout)),
        }
    }
}

/// Rewrite an inbound request so it targets `target`, keeping method,
/// headers, body, path and query.
pub fn build_outbound_request(
    target: &BackendTarget,
    req: Request<AxumBody>,
) -> HttpClientResult<Request<AxumBody>> {
    let (mut parts, body) = req.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .cloned()
        .unwrap_or_else(|| PathAndQuery::from_static("/"));

    parts.uri = Uri::builder()
        .scheme(target.scheme().clone())
        .authority(target.authority().clone())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))?;
    parts.version = Version::HTTP_11;
    parts.extensions.clear();

    strip_hop_by_hop_headers(&mut parts.headers);

    let host = HeaderValue::from_str(target.authority().as_str())
        .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))?;
    parts.headers.insert(header::HOST, host);

    Ok(Request::from_parts(parts, body))
}

/// Pass the backend response through, minus hop-by-hop headers. The body
/// fails if no frame arrives within `idle_timeout`.
pub fn relay_response(response: Response<AxumBody>, idle_timeout: Duration) -> Response<AxumBody> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop_headers(&mut parts.headers);
    Response::from_parts(parts, with_idle_timeout(body, idle_timeout))
}

/// The timer restarts on every frame, so slow but steady streams are not cut.
/// Finished bodies stay unwrapped to keep their exact size hint.
fn with_idle_timeout(body: AxumBody, idle_timeout: Duration) -> AxumBody {
    if body.is_end_stream() {
        return body;
    }
    AxumBody::new(TimeoutBody::new(idle_timeout, body))
}

/// Remove the standard hop-by-hop headers and any header named in `Connection`.
pub fn strip_hop_by_hop_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// The only failure response the dispatcher produces. Carries no detail.
pub fn bad_gateway() -> Response<AxumBody> {
    let mut response = Response::new(AxumBody::from(BAD_GATEWAY_BODY));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
