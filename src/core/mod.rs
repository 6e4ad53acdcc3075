pub mod backend;
pub mod dispatcher;
pub mod route_table;
pub mod router;

pub use backend::{BackendError, BackendTarget};
pub use dispatcher::ProxyDispatcher;
pub use route_table::{Route, RoutePattern, RouteTable, RouteTableError};
pub use router::{RouteMatch, Router};
