use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// HTTP client adapter using Hyper with Rustls.
///
/// Responsibilities:
/// * Owns the pooled connections to every backend (safe for concurrent reuse)
/// * Speaks plain HTTP or HTTPS depending on the outbound URI scheme
/// * Converts between Hyper body and Axum body types without buffering
///
/// Timeouts, retries and error translation belong to the dispatcher; this
/// adapter only moves bytes.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new() -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::info!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        tracing::debug!("Created pooled HTTP/1.1 backend client");
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>> {
        if req.uri().host().is_none() {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        }

        let method = req.method().clone();
        let uri = req.uri().clone();
        tracing::debug!("Sending request: {} {}", method, uri);
        tracing::trace!("Outgoing request headers: {:?}", req.headers());

        // Dropping this future (client went away, timeout fired) drops the
        // in-flight request and releases its connection.
        match self.client.request(req).await {
            Ok(response) => {
                let (parts, hyper_body) = response.into_parts();
                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Err(e) => Err(HttpClientError::ConnectionError(format!(
                "Request to {method} {uri} failed: {e}"
            ))),
        }
    }
}
