//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request facts (host, path, query, locale hints)
//!     → matcher.rs (asset / framework path exclusion)
//!     → host.rs (normalize host, detect local dev)
//!     → router.rs (redirect rules, canonical host, tenant rewrite)
//!     → Return: Decision (pass-through | redirect | rewrite)
//!
//! Router compilation (at startup and on reload):
//!     RouterConfig
//!     → Compile exclusion matchers
//!     → Freeze as immutable TenantRouter
//! ```
//!
//! # Design Decisions
//! - Routers compiled from config, immutable at runtime
//! - No regex in hot path (prefix/suffix checks only)
//! - Deterministic: same input always yields the same decision

pub mod decision;
pub mod host;
pub mod matcher;
pub mod router;

pub use decision::{Decision, Reason};
pub use host::Hostname;
pub use router::{RequestFacts, TenantRouter};
