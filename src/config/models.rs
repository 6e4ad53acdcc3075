//! Configuration data structures for Gangway.
//!
//! These types map directly to the JSON configuration file (TOML and YAML are
//! accepted too). Every field except `routes` has a default so that a minimal
//! config only needs to declare its routes. The value is built once at startup
//! and never mutated afterwards.
use std::time::Duration;

use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

fn default_port() -> String {
    "8080".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

/// A single route declaration: inbound path pattern and backend base URL.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Exact path (`/ping2`) or prefix pattern ending in `/*` (`/api/*`)
    pub path: String,
    /// Absolute backend URL, `scheme://host[:port]`
    pub target: String,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: target.into(),
        }
    }
}

/// Top level gateway configuration.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_host")]
    pub host: String,
    /// Outbound request bound, parsed by humantime (e.g. "30s", "500ms")
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
    /// Routes in declaration order; the first match wins.
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl GatewayConfig {
    /// Create a new gateway configuration builder
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }

    /// The `host:port` string the server binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parse `request_timeout` into a [`Duration`].
    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.request_timeout)
            .wrap_err_with(|| format!("Invalid request_timeout '{}'", self.request_timeout))
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            request_timeout: default_request_timeout(),
            routes: Vec::new(),
        }
    }
}

/// Builder for GatewayConfig, mostly useful for embedding and tests
#[derive(Default)]
pub struct GatewayConfigBuilder {
    port: Option<String>,
    host: Option<String>,
    request_timeout: Option<String>,
    routes: Vec<RouteConfig>,
}

impl GatewayConfigBuilder {
    /// Set the listening port
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Set the bind host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the outbound request timeout (humantime string)
    pub fn request_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.request_timeout = Some(timeout.into());
        self
    }

    /// Append a route. Declaration order is preserved.
    pub fn route(mut self, path: impl Into<String>, target: impl Into<String>) -> Self {
        self.routes.push(RouteConfig::new(path, target));
        self
    }

    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            port: self.port.unwrap_or_else(default_port),
            host: self.host.unwrap_or_else(default_host),
            request_timeout: self.request_timeout.unwrap_or_else(default_request_timeout),
            routes: self.routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{"routes":[{"path":"/svc/*","target":"http://localhost:5001"}]}"#,
        )
        .unwrap();

        assert_eq!(config.port, "8080");
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(30));
        assert_eq!(
            config.routes,
            vec![RouteConfig::new("/svc/*", "http://localhost:5001")]
        );
    }

    #[test]
    fn builder_keeps_declaration_order() {
        let config = GatewayConfig::builder()
            .port("9090")
            .request_timeout("250ms")
            .route("/b", "http://b:1")
            .route("/a", "http://a:1")
            .build();

        assert_eq!(config.routes[0].path, "/b");
        assert_eq!(config.routes[1].path, "/a");
        assert_eq!(
            config.request_timeout().unwrap(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn bad_timeout_is_an_error() {
        let config = GatewayConfig::builder().request_timeout("soon").build();
        assert!(config.request_timeout().is_err());
    }
}
