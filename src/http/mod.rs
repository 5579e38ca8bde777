//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → middleware.rs (routing decision, session cookie)
//!         → redirect: response.rs answers directly
//!         → pass-through / rewrite: upstream.rs forwards
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod tls;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::{HttpServer, ServerError};
