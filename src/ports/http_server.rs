use eyre::Result;

/// HttpServer defines the port (interface) for running the gateway listener
pub trait HttpServer: Send + Sync + 'static {
    /// Bind the configured address and serve until shutdown
    ///
    /// # Returns
    /// A future that resolves when the server shuts down or encounters an error
    fn run(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}
