use std::str::FromStr;

use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Output format for gateway logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line, for log shippers
    #[default]
    Json,
    /// Human readable multi-line output for development
    Pretty,
}

impl FromStr for LogFormat {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "console" => Ok(Self::Pretty),
            other => Err(eyre::eyre!(
                "Unknown log format '{other}', expected 'json' or 'pretty'"
            )),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize structured logging. The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing(format: LogFormat) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => Registry::default()
            .with(env_filter())
            .with(
                fmt_layer
                    .json()
                    .with_current_span(false)
                    .with_span_list(true),
            )
            .try_init(),
        LogFormat::Pretty => Registry::default()
            .with(env_filter())
            .with(fmt_layer.pretty())
            .try_init(),
    }
    .wrap_err("Failed to install tracing subscriber")?;

    tracing::info!("Gangway logging initialized ({:?})", format);
    Ok(())
}

/// Create a request-scoped tracing span
pub fn create_request_span(method: &str, path: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.path = path,
        request.id = request_id,
        http.status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

/// Create a backend request span
pub fn create_backend_span(backend_url: &str, method: &str, path: &str) -> tracing::Span {
    tracing::info_span!(
        "backend_request",
        backend.url = backend_url,
        http.method = method,
        http.path = path,
        http.status_code = tracing::field::Empty,
    )
}
