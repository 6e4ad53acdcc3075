use std::{any::Any, sync::Arc};

use axum::{
    body::Body as AxumBody,
    extract::Request,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    adapters::{HttpHandler, middleware::request_logging},
    config::GatewayConfig,
    core::{ProxyDispatcher, RouteTable, Router},
    ports::{http_client::HttpClient, http_server::HttpServer},
    utils::GracefulShutdown,
};

/// Accepts inbound connections and hands every request to [`HttpHandler`].
///
/// Each connection and request runs on its own task; the only shared data is
/// the immutable route table and the backend connection pool.
pub struct GatewayServer {
    config: Arc<GatewayConfig>,
    handler: HttpHandler,
    shutdown: Arc<GracefulShutdown>,
}

impl GatewayServer {
    pub fn new(
        config: Arc<GatewayConfig>,
        handler: HttpHandler,
        shutdown: Arc<GracefulShutdown>,
    ) -> Self {
        Self {
            config,
            handler,
            shutdown,
        }
    }

    /// Wire the route table, dispatcher and handler from a loaded config.
    ///
    /// Fails on any invalid route or timeout, before anything is bound.
    pub fn from_config(
        config: Arc<GatewayConfig>,
        http_client: Arc<dyn HttpClient>,
        shutdown: Arc<GracefulShutdown>,
    ) -> Result<Self> {
        let table = RouteTable::from_config(&config).wrap_err("Failed to build route table")?;
        let request_timeout = config.request_timeout()?;

        for route in table.iter() {
            tracing::info!(
                "Configured route: {} -> {}",
                route.declared_path(),
                route.target()
            );
        }

        let router = Router::new(Arc::new(table));
        let dispatcher = ProxyDispatcher::new(http_client, request_timeout);
        Ok(Self::new(
            config,
            HttpHandler::new(router, dispatcher),
            shutdown,
        ))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The axum application: every path and method goes to the handler.
    pub fn app(&self) -> axum::Router {
        let handler = self.handler.clone();

        axum::Router::new()
            .fallback(move |req: Request| {
                let handler = handler.clone();
                async move { handler.handle(req).await }
            })
            .layer(
                ServiceBuilder::new()
                    .layer(axum::middleware::from_fn(request_logging))
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
    }

    /// Bind the configured `host:port`.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen_addr();
        TcpListener::bind(&addr)
            .await
            .wrap_err_with(|| format!("Failed to bind to address {addr}"))
    }

    /// Serve on an already bound listener until shutdown is triggered.
    /// In-flight requests are allowed to finish.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener
            .local_addr()
            .wrap_err("Failed to read local address")?;
        tracing::info!("Gangway gateway listening on {}", addr);

        let mut token = self.shutdown.shutdown_token();
        axum::serve(listener, self.app())
            .with_graceful_shutdown(async move {
                let reason = token.wait_for_shutdown().await;
                tracing::info!("Stopping listener: {:?}", reason);
            })
            .await
            .wrap_err("Server error")?;

        tracing::info!("Gangway gateway stopped");
        Ok(())
    }
}

impl HttpServer for GatewayServer {
    async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }
}

/// A panicking request gets a bare 500; other requests are unaffected.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response<AxumBody> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("Request handler panicked: {}", detail);

    let mut response = Response::new(AxumBody::from("Internal Server Error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
