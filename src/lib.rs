//! Multi-tenant request router.
//!
//! Sits in front of a web application and decides, per request, whether to
//! pass it through, redirect the client, or rewrite the path to a
//! tenant-specific internal route, issuing a session cookie on the way.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod locale;
pub mod observability;
pub mod routing;
pub mod security;
pub mod session;

pub use config::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Decision, RequestFacts, TenantRouter};
