//! Routing outcomes.

use axum::http::StatusCode;
use serde::Serialize;

/// Why a decision was made. Used as a log field and metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Static asset or framework path.
    Excluded,
    /// No usable host on the request.
    NoHost,
    /// Host serves the platform itself.
    PlatformHost,
    /// Local dev request without enough path segments to name a tenant.
    LocalRoot,
    /// Explicit redirect rule.
    RedirectRule,
    /// `www.` host redirected to its bare name.
    CanonicalHost,
    /// Client sent away to pick up locale parameters.
    Locale,
    /// Local dev request rewritten from its path segments.
    LocalTenant,
    /// Production request rewritten from its hostname.
    Tenant,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Excluded => "excluded",
            Reason::NoHost => "no_host",
            Reason::PlatformHost => "platform_host",
            Reason::LocalRoot => "local_root",
            Reason::RedirectRule => "redirect_rule",
            Reason::CanonicalHost => "canonical_host",
            Reason::Locale => "locale",
            Reason::LocalTenant => "local_tenant",
            Reason::Tenant => "tenant",
        }
    }
}

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    /// Forward unchanged.
    PassThrough { reason: Reason },
    /// Answer with a redirect; the upstream never sees the request.
    Redirect {
        location: String,
        permanent: bool,
        reason: Reason,
    },
    /// Forward with the path-and-query replaced. The host is unchanged.
    Rewrite { path_and_query: String, reason: Reason },
}

impl Decision {
    pub fn pass(reason: Reason) -> Self {
        Decision::PassThrough { reason }
    }

    pub fn reason(&self) -> Reason {
        match self {
            Decision::PassThrough { reason }
            | Decision::Redirect { reason, .. }
            | Decision::Rewrite { reason, .. } => *reason,
        }
    }

    /// Metric label for the outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            Decision::PassThrough { .. } => "pass_through",
            Decision::Redirect { .. } => "redirect",
            Decision::Rewrite { .. } => "rewrite",
        }
    }

    /// Redirect status: 308 when permanent, 307 otherwise. `None` for other outcomes.
    pub fn redirect_status(&self) -> Option<StatusCode> {
        match self {
            Decision::Redirect { permanent: true, .. } => Some(StatusCode::PERMANENT_REDIRECT),
            Decision::Redirect { permanent: false, .. } => Some(StatusCode::TEMPORARY_REDIRECT),
            _ => None,
        }
    }
}
