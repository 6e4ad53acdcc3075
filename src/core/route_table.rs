//! Immutable, ordered route table.
//!
//! A [`RouteTable`] is built once from [`GatewayConfig`] and never changes.
//! Every target URL and pattern is parsed during construction, so an invalid
//! entry is reported before the server binds its port instead of surfacing
//! on the first request that hits it. Duplicate patterns are legal; only the
//! first is reachable.
use thiserror::Error;

use crate::{
    config::GatewayConfig,
    core::backend::{BackendError, BackendTarget},
};

/// Errors raised while building a route table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RouteTableError {
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid target for route '{path}': {source}")]
    InvalidRouteTarget {
        path: String,
        #[source]
        source: BackendError,
    },
}

/// How a route's path is compared against an inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePattern {
    /// Matches only this exact path
    Exact(String),
    /// Matches every path starting with this prefix (stored with its trailing `/`)
    Prefix(String),
}

impl RoutePattern {
    /// Parse a configured pattern. `/api/*` becomes `Prefix("/api/")`,
    /// `/*` matches everything, anything without `*` is exact.
    pub fn parse(pattern: &str) -> Result<Self, RouteTableError> {
        let invalid = |reason: &str| RouteTableError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("patterns must start with '/'"));
        }

        match pattern.find('*') {
            None => Ok(Self::Exact(pattern.to_string())),
            Some(idx) if idx == pattern.len() - 1 && pattern.ends_with("/*") => {
                Ok(Self::Prefix(pattern[..idx].to_string()))
            }
            Some(_) => Err(invalid(
                "a wildcard is only allowed as the final '/*' segment",
            )),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// A validated route: the pattern as declared plus its parsed form and target.
#[derive(Debug, Clone)]
pub struct Route {
    declared: String,
    pattern: RoutePattern,
    target: BackendTarget,
}

impl Route {
    pub fn new(path: &str, target: &str) -> Result<Self, RouteTableError> {
        let pattern = RoutePattern::parse(path)?;
        let target =
            BackendTarget::new(target).map_err(|source| RouteTableError::InvalidRouteTarget {
                path: path.to_string(),
                source,
            })?;

        Ok(Self {
            declared: path.to_string(),
            pattern,
            target,
        })
    }

    /// The pattern string exactly as it appeared in configuration
    pub fn declared_path(&self) -> &str {
        &self.declared
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn target(&self) -> &BackendTarget {
        &self.target
    }
}

/// Ordered sequence of routes; declaration order is match order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build the table from configuration, failing on the first invalid route.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteTableError> {
        let routes = config
            .routes
            .iter()
            .map(|route| Route::new(&route.path, &route.target))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { routes })
    }

    /// First route, in declaration order, whose pattern matches `path`.
    pub fn first_match(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.pattern.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
