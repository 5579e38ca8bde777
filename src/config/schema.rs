//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the tenant router.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouterConfig {
    /// Deployment mode; drives defaults such as the `Secure` cookie flag.
    pub mode: Mode,

    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// The application that receives pass-through and rewritten requests.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Tenant resolution settings.
    pub tenancy: TenancyConfig,

    /// Paths that are never rewritten.
    pub assets: AssetConfig,

    /// Canonical host redirects.
    pub canonical: CanonicalConfig,

    /// Explicit redirect rules, checked in order.
    pub redirects: Vec<RedirectRule>,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Locale/country query-parameter injection.
    pub locale: LocaleConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl RouterConfig {
    /// Whether the session cookie carries the `Secure` attribute.
    pub fn cookie_secure(&self) -> bool {
        self.session.secure.unwrap_or(self.mode == Mode::Production)
    }
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
            connect_timeout_secs: 5,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Tenant resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TenancyConfig {
    /// Internal route prefix tenant requests are rewritten under.
    pub rewrite_prefix: String,

    /// Hosts serving the platform itself; never rewritten.
    pub platform_hosts: Vec<String>,

    /// Hosts treated as local development in addition to `*localhost*`.
    pub local_hosts: Vec<String>,

    /// Minimum number of path segments before a local request is rewritten.
    pub local_min_segments: usize,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            rewrite_prefix: "/_sites".to_string(),
            platform_hosts: Vec::new(),
            local_hosts: vec!["127.0.0.1".to_string(), "[::1]".to_string()],
            local_min_segments: 1,
        }
    }
}

/// Static asset and framework path exclusions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Path prefixes passed through unchanged.
    pub excluded_prefixes: Vec<String>,

    /// File extensions passed through unchanged (case-insensitive).
    pub extensions: Vec<String>,

    /// Pass through any path whose last segment looks like `name.ext`.
    pub exclude_dotted_files: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: ["/api/", "/_next", "/_static", "/_vercel", "/static"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extensions: [".jpg", ".jpeg", ".png", ".svg"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_dotted_files: true,
        }
    }
}

/// Canonical host handling.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CanonicalConfig {
    /// Permanently redirect `www.<host>` to `<host>`.
    pub strip_www: bool,

    /// Use `https` in canonical redirect locations regardless of the request scheme.
    pub https: bool,
}

/// A single explicit redirect.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RedirectRule {
    /// Host to match (exact, case-insensitive). `None` matches any host.
    #[serde(default)]
    pub host: Option<String>,

    /// Path to match (exact). `None` matches any path.
    #[serde(default)]
    pub path: Option<String>,

    /// Target URL or absolute path.
    pub destination: String,

    /// 308 when true, 307 otherwise.
    #[serde(default)]
    pub permanent: bool,

    /// Append the request path and query to the destination.
    #[serde(default)]
    pub preserve_path: bool,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name.
    pub cookie_name: String,

    /// Cookie lifetime in seconds.
    pub max_age_secs: u64,

    /// Force the `Secure` attribute on or off; defaults to on in production.
    pub secure: Option<bool>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_id".to_string(),
            max_age_secs: 60 * 60 * 24 * 7,
            secure: None,
        }
    }
}

/// How missing locale parameters are supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocaleMode {
    /// Append to the internal rewrite target.
    #[default]
    Rewrite,
    /// Redirect the client to its own URL with the parameters added.
    Redirect,
}

/// Locale/country injection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub enabled: bool,
    pub mode: LocaleMode,
    pub default_language: String,
    pub default_country: String,
    pub language_param: String,
    pub country_param: String,

    /// Headers carrying a two-letter country code, checked in order.
    pub country_headers: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: LocaleMode::Rewrite,
            default_language: "en".to_string(),
            default_country: "US".to_string(),
            language_param: "lang".to_string(),
            country_param: "country".to_string(),
            country_headers: vec!["x-vercel-ip-country".to_string(), "cf-ipcountry".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
