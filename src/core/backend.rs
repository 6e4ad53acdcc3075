use std::{fmt, str::FromStr};

use http::uri::{Authority, Scheme};
use thiserror::Error;
use url::Url;

/// Errors related to backend target parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    /// The target is not an absolute URL
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The scheme cannot be proxied to
    #[error("Backend URL '{url}' must use http or https, got '{scheme}'")]
    UnsupportedScheme { url: String, scheme: String },

    /// The URL has no host component
    #[error("Backend URL '{0}' has no host")]
    MissingHost(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// A validated backend base URL.
///
/// Only the scheme and authority take part in forwarding. Any path or query
/// on the configured URL is remembered so callers can warn about it, but the
/// inbound path is always forwarded as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    url: String,
    scheme: Scheme,
    authority: Authority,
    has_path: bool,
}

impl BackendTarget {
    /// Parse and validate a target URL.
    pub fn new(url: &str) -> BackendResult<Self> {
        let parsed = Url::parse(url).map_err(|e| BackendError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match parsed.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => {
                return Err(BackendError::UnsupportedScheme {
                    url: url.to_string(),
                    scheme: other.to_string(),
                });
            }
        };

        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(BackendError::MissingHost(url.to_string())),
        };

        // Url::port is None when the port equals the scheme default
        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority = Authority::from_str(&authority).map_err(|e| BackendError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let has_path = parsed.path() != "/" || parsed.query().is_some();

        Ok(Self {
            url: url.to_string(),
            scheme,
            authority,
            has_path,
        })
    }

    /// The URL as written in configuration
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// `host[:port]`, also used as the outbound `Host` header
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// True when the configured URL carries a path or query that forwarding ignores.
    pub fn has_ignored_path(&self) -> bool {
        self.has_path
    }
}

impl FromStr for BackendTarget {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}
