//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware and forwarder produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, filtered by RUST_LOG or config)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log lines
//! - Metrics are cheap (atomic increments) and no-ops when no recorder is installed

pub mod logging;
pub mod metrics;
