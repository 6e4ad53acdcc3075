use std::{collections::HashSet, net::SocketAddr, time::Duration};

use crate::{
    config::models::{GatewayConfig, RouteConfig},
    core::{
        backend::BackendTarget,
        route_table::{RoutePattern, RouteTableError},
    },
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Invalid route pattern '{path}': {message}")]
    InvalidRoutePattern { path: String, message: String },

    #[error("Invalid target '{target}' for route '{path}': {message}")]
    InvalidRouteTarget {
        path: String,
        target: String,
        message: String,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Non-fatal findings worth logging at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    NoRoutes,
    DuplicatePattern { path: String },
    TargetPathIgnored { path: String, target: String },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRoutes => write!(f, "No routes configured; only /ping will answer"),
            Self::DuplicatePattern { path } => {
                write!(f, "Route '{path}' repeats an earlier pattern and is unreachable")
            }
            Self::TargetPathIgnored { path, target } => write!(
                f,
                "Route '{path}' target '{target}' has a path or query that is not forwarded"
            ),
        }
    }
}

/// Gateway configuration validator
pub struct GatewayConfigValidator;

impl GatewayConfigValidator {
    /// Validate the entire configuration, reporting every problem at once.
    pub fn validate(config: &GatewayConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(config) {
            errors.push(e);
        }

        if let Err(e) = Self::validate_request_timeout(&config.request_timeout) {
            errors.push(e);
        }

        for route in &config.routes {
            if let Err(mut route_errors) = Self::validate_single_route(route) {
                errors.append(&mut route_errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Findings that do not stop startup but usually indicate a mistake.
    pub fn warnings(config: &GatewayConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.routes.is_empty() {
            warnings.push(ValidationWarning::NoRoutes);
        }

        let mut seen = HashSet::new();
        for route in &config.routes {
            let Ok(pattern) = RoutePattern::parse(&route.path) else {
                continue;
            };
            let key = match pattern {
                RoutePattern::Exact(p) => (false, p),
                RoutePattern::Prefix(p) => (true, p),
            };
            if !seen.insert(key) {
                warnings.push(ValidationWarning::DuplicatePattern {
                    path: route.path.clone(),
                });
            }

            if BackendTarget::new(&route.target).is_ok_and(|t| t.has_ignored_path()) {
                warnings.push(ValidationWarning::TargetPathIgnored {
                    path: route.path.clone(),
                    target: route.target.clone(),
                });
            }
        }

        warnings
    }

    /// Validate port and bind host
    fn validate_listen_address(config: &GatewayConfig) -> ValidationResult<()> {
        if config.port.parse::<u16>().is_err() {
            return Err(ValidationError::InvalidField {
                field: "port".to_string(),
                message: format!("'{}' is not a valid port number", config.port),
            });
        }

        let address = config.listen_addr();
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address,
                reason: "host must be an IP address (e.g. '0.0.0.0' or '127.0.0.1')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_request_timeout(timeout: &str) -> ValidationResult<()> {
        match humantime::parse_duration(timeout) {
            Ok(duration) if duration == Duration::ZERO => Err(ValidationError::InvalidField {
                field: "request_timeout".to_string(),
                message: "must be greater than zero".to_string(),
            }),
            Ok(_) => Ok(()),
            Err(e) => Err(ValidationError::InvalidField {
                field: "request_timeout".to_string(),
                message: format!("'{timeout}' is not a duration: {e}"),
            }),
        }
    }

    /// Validate a single route's pattern and target
    fn validate_single_route(route: &RouteConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(RouteTableError::InvalidPattern { reason, .. }) =
            RoutePattern::parse(&route.path)
        {
            errors.push(ValidationError::InvalidRoutePattern {
                path: route.path.clone(),
                message: reason,
            });
        }

        if let Err(e) = BackendTarget::new(&route.target) {
            errors.push(ValidationError::InvalidRouteTarget {
                path: route.path.clone(),
                target: route.target.clone(),
                message: e.to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
