//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!     → compiled into a TenantRouter
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → config sent to the server, which swaps in a new router
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AssetConfig, CanonicalConfig, ListenerConfig, LocaleConfig, LocaleMode, Mode,
    ObservabilityConfig, RedirectRule, RouterConfig, SessionConfig, TenancyConfig,
    TlsConfig, UpstreamConfig,
};
