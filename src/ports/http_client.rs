use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response};
use thiserror::Error;

/// Custom error type for HTTP client operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Connect, DNS or TLS failure talking to the backend
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend did not answer within the configured bound
    #[error("Timeout error after {0:?}")]
    Timeout(Duration),

    /// Error when request is invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl HttpClientError {
    /// Timeouts and connection failures are both reported as backend unavailability.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// HttpClient defines the port (interface) for making HTTP requests to backends
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an HTTP request to a backend server
    ///
    /// # Arguments
    /// * `req` - The fully rewritten outbound request (absolute URI)
    ///
    /// # Returns
    /// The backend's response with a streaming body, or an error when no
    /// response was obtained
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>>;
}
