//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that would otherwise
//! surface as surprising routing behavior at runtime. All problems are
//! collected, not just the first.

use std::net::SocketAddr;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_socket_addr(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let prefix = &config.tenancy.rewrite_prefix;
    if !prefix.starts_with('/') || prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "tenancy.rewrite_prefix",
            "must start with '/' and must not end with '/'",
        ));
    }

    for (i, ext) in config.assets.extensions.iter().enumerate() {
        if !ext.starts_with('.') || ext.len() < 2 {
            errors.push(ValidationError::new(
                format!("assets.extensions[{i}]"),
                "must look like '.ext'",
            ));
        }
    }
    for (i, p) in config.assets.excluded_prefixes.iter().enumerate() {
        if !p.starts_with('/') {
            errors.push(ValidationError::new(
                format!("assets.excluded_prefixes[{i}]"),
                "must start with '/'",
            ));
        }
    }

    for (i, rule) in config.redirects.iter().enumerate() {
        let field = format!("redirects[{i}]");
        if rule.host.is_none() && rule.path.is_none() {
            errors.push(ValidationError::new(&field, "needs a host or a path to match"));
        }
        if rule.destination.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.destination"), "must not be empty"));
        }
        if let Some(path) = &rule.path {
            if !path.starts_with('/') {
                errors.push(ValidationError::new(format!("{field}.path"), "must start with '/'"));
            }
        }
    }

    let name = &config.session.cookie_name;
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        errors.push(ValidationError::new("session.cookie_name", "must be a non-empty HTTP token"));
    }
    if config.session.max_age_secs == 0 {
        errors.push(ValidationError::new("session.max_age_secs", "must be greater than 0"));
    }

    let locale = &config.locale;
    if locale.default_language.is_empty()
        || !locale.default_language.chars().all(|c| c.is_ascii_alphabetic())
    {
        errors.push(ValidationError::new("locale.default_language", "must be alphabetic"));
    }
    if locale.default_country.is_empty()
        || !locale.default_country.chars().all(|c| c.is_ascii_alphabetic())
    {
        errors.push(ValidationError::new("locale.default_country", "must be alphabetic"));
    }
    if locale.language_param.is_empty() || locale.country_param.is_empty() {
        errors.push(ValidationError::new("locale", "parameter names must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("'{value}' is not a socket address")));
    }
}

/// RFC 7230 `tchar`.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
