//! Request logging middleware.
//!
//! Wraps every inbound request in a `request` span with a generated id and
//! logs start and completion with latency. The id only lives in the logs; it
//! is never written into forwarded headers.
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;

use crate::tracing_setup::create_request_span;

/// Log start/end of a request including latency.
pub async fn request_logging(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = create_request_span(method.as_str(), uri.path(), &request_id);

    async move {
        tracing::info!("Started processing {} {}", method, uri);

        let response = next.run(req).await;
        let duration = start.elapsed();

        let span = tracing::Span::current();
        span.record("http.status_code", response.status().as_u16());
        span.record("duration_ms", duration.as_millis() as u64);

        if response.status().is_server_error() {
            tracing::warn!(
                "Completed {} {} - {} in {:?}",
                method,
                uri,
                response.status(),
                duration
            );
        } else {
            tracing::info!(
                "Completed {} {} - {} in {:?}",
                method,
                uri,
                response.status(),
                duration
            );
        }

        response
    }
    .instrument(span)
    .await
}
