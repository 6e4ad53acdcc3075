use std::sync::Arc;

use hyper::Method;

use crate::core::route_table::{Route, RouteTable};

/// Outcome of resolving an inbound path.
#[derive(Debug, Clone, Copy)]
pub enum RouteMatch<'a> {
    Matched(&'a Route),
    NotFound,
}

impl<'a> RouteMatch<'a> {
    pub fn route(&self) -> Option<&'a Route> {
        match self {
            Self::Matched(route) => Some(route),
            Self::NotFound => None,
        }
    }
}

/// Resolves inbound requests against a shared, read-only [`RouteTable`].
///
/// Cloning is cheap and lookups take no locks.
#[derive(Debug, Clone)]
pub struct Router {
    table: Arc<RouteTable>,
}

impl Router {
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Select the first route matching `path`. The method never takes part
    /// in matching; it is accepted so callers pass the full request identity.
    pub fn resolve(&self, path: &str, _method: &Method) -> RouteMatch<'_> {
        match self.table.first_match(path) {
            Some(route) => RouteMatch::Matched(route),
            None => RouteMatch::NotFound,
        }
    }
}
