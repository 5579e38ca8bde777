//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request forwarded upstream:
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → upstream
//!
//! Response returned to client:
//!     → headers.rs (strip hop-by-hop)
//! ```
//!
//! # Design Decisions
//! - Never trust an inbound X-Forwarded-Host; it is overwritten

pub mod headers;
