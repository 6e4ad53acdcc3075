use std::sync::{Arc, OnceLock};

use eyre::Result;
use tokio::{signal, sync::broadcast};

/// Represents different shutdown reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Triggered programmatically
    Requested,
    /// The shutdown manager was dropped
    ChannelClosed,
}

/// Broadcasts a single shutdown decision to every interested task.
///
/// The first trigger wins; later signals are logged and ignored.
pub struct GracefulShutdown {
    shutdown_tx: broadcast::Sender<ShutdownReason>,
    reason: Arc<OnceLock<ShutdownReason>>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            reason: Arc::new(OnceLock::new()),
        }
    }

    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.reason.get().is_some()
    }

    /// The reason shutdown was initiated, if it has been
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.get().copied()
    }

    /// Manually trigger shutdown
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        self.initiate_shutdown(reason);
    }

    /// Listen for SIGINT and SIGTERM and initiate shutdown on the first one.
    pub async fn run_signal_handler(&self) -> Result<()> {
        tracing::info!("Signal handler started. Listening for SIGTERM and SIGINT");

        tokio::select! {
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    return Err(e.into());
                }
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                self.initiate_shutdown(ShutdownReason::Interrupt);
            }
            _ = wait_for_sigterm() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                self.initiate_shutdown(ShutdownReason::Terminate);
            }
        }

        Ok(())
    }

    fn initiate_shutdown(&self, reason: ShutdownReason) {
        if self.reason.set(reason).is_ok() {
            tracing::info!("Processing shutdown signal: {:?}", reason);
            // No receivers is fine: late subscribers read `reason` instead
            let _ = self.shutdown_tx.send(reason);
        } else {
            tracing::warn!("Shutdown already initiated, ignoring {:?}", reason);
        }
    }

    /// Create a shutdown token that can be used to cancel operations
    pub fn shutdown_token(&self) -> ShutdownToken {
        ShutdownToken {
            receiver: self.shutdown_tx.subscribe(),
            reason: self.reason.clone(),
        }
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::error!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    // On non-Unix systems, we only have Ctrl+C
    std::future::pending::<()>().await;
}

/// A token that can be used to wait for the shutdown decision
pub struct ShutdownToken {
    receiver: broadcast::Receiver<ShutdownReason>,
    reason: Arc<OnceLock<ShutdownReason>>,
}

impl Clone for ShutdownToken {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.resubscribe(),
            reason: self.reason.clone(),
        }
    }
}

impl ShutdownToken {
    /// Check if shutdown has been initiated
    pub fn is_shutdown_initiated(&self) -> bool {
        self.reason.get().is_some()
    }

    /// Resolve once shutdown is initiated, including when it happened
    /// before this token was created.
    pub async fn wait_for_shutdown(&mut self) -> ShutdownReason {
        if let Some(reason) = self.reason.get() {
            return *reason;
        }
        match self.receiver.recv().await {
            Ok(reason) => reason,
            Err(_) => self
                .reason
                .get()
                .copied()
                .unwrap_or(ShutdownReason::ChannelClosed),
        }
    }
}
