//! Gangway - a lightweight HTTP gateway.
//!
//! Gangway loads a declarative route table once at startup and forwards every
//! inbound request to the backend of the first matching route. It is meant to
//! be the single ingress point for a handful of services when a full service
//! mesh would be overkill.
//!
//! # Features
//! - Exact and trailing-wildcard (`/api/*`) path patterns, first match wins
//! - Method-agnostic forwarding with the inbound path and query preserved
//! - Streaming request and response bodies
//! - Fixed per-request backend timeout; failures and timeouts become `502`
//! - Idle timeout on streamed bodies, so a stalled backend cannot pin a connection
//! - `GET /ping` liveness probe that never touches a backend
//! - Structured logging via `tracing`, graceful shutdown on SIGINT/SIGTERM
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use gangway::{
//!     GatewayServer, HttpClientAdapter, config::GatewayConfig, ports::http_server::HttpServer,
//!     utils::GracefulShutdown,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let cfg: GatewayConfig = gangway::config::load_config("config.json").await?;
//! let server = GatewayServer::from_config(
//!     Arc::new(cfg),
//!     Arc::new(HttpClientAdapter::new()?),
//!     Arc::new(GracefulShutdown::new()),
//! )?;
//! server.run().await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! routing and forwarding logic inside `core`. The route table is immutable after
//! construction and shared by reference, so request handling takes no locks.
//!
//! # Error Handling
//! Startup paths return `eyre::Result<T>` with context attached; any invalid
//! configuration stops the process before the listener is bound. Request paths never
//! fail the process: unmatched paths answer `404`, backend failures answer `502`.
pub mod adapters;
pub mod config;
pub mod core;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub use crate::{
    adapters::{GatewayServer, HttpClientAdapter, HttpHandler},
    core::{ProxyDispatcher, RouteMatch, RouteTable, Router},
    ports::http_client::HttpClient,
    utils::GracefulShutdown,
};
