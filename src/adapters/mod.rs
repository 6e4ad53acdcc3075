pub mod http_client;
pub mod http_handler;
pub mod http_server;
pub mod middleware;

/// Re-export commonly used types from adapters
pub use http_client::HttpClientAdapter;
pub use http_handler::HttpHandler;
pub use http_server::GatewayServer;
