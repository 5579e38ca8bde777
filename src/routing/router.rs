//! Tenant route decisions.
//!
//! # Responsibilities
//! - Hold the compiled exclusion set, redirect rules and tenancy settings
//! - Turn the routing-relevant facts of one request into a [`Decision`]
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Pure: no I/O, no clock, same input always yields the same decision
//! - First matching redirect rule wins (config order)

use crate::config::{CanonicalConfig, LocaleConfig, LocaleMode, RedirectRule, RouterConfig};
use crate::locale::{self, Locale};
use crate::routing::decision::{Decision, Reason};
use crate::routing::host::Hostname;
use crate::routing::matcher::{AnyMatcher, Matcher};

/// The parts of a request the router looks at.
#[derive(Debug, Clone, Copy)]
pub struct RequestFacts<'a> {
    /// Raw `Host` header (or URI authority).
    pub host: Option<&'a str>,
    /// `http` or `https`, as seen by the client.
    pub scheme: &'a str,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub accept_language: Option<&'a str>,
    /// Two-letter country code supplied by an edge header.
    pub country: Option<&'a str>,
}

impl<'a> RequestFacts<'a> {
    pub fn new(host: Option<&'a str>, path: &'a str) -> Self {
        Self {
            host,
            scheme: "http",
            path,
            query: None,
            accept_language: None,
            country: None,
        }
    }

    pub fn with_scheme(mut self, scheme: &'a str) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query.filter(|q| !q.is_empty());
        self
    }

    pub fn with_accept_language(mut self, value: Option<&'a str>) -> Self {
        self.accept_language = value;
        self
    }

    pub fn with_country(mut self, value: Option<&'a str>) -> Self {
        self.country = value;
        self
    }

    fn path_and_query(&self) -> String {
        with_query(self.path.to_string(), self.query)
    }
}

fn with_query(path: String, query: Option<&str>) -> String {
    match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path,
    }
}

/// Append the request path to a redirect destination. A query on the
/// destination comes first, followed by the request's own query.
fn preserve_path(destination: &str, req: &RequestFacts<'_>) -> String {
    let (base, dest_query) = match destination.split_once('?') {
        Some((base, q)) => (base, Some(q).filter(|q| !q.is_empty())),
        None => (destination, None),
    };
    let path = format!("{}{}", base.trim_end_matches('/'), req.path);
    let query = match (dest_query, req.query) {
        (Some(a), Some(b)) => Some(format!("{a}&{b}")),
        (a, b) => a.or(b).map(str::to_string),
    };
    with_query(path, query.as_deref())
}

/// Decides pass-through, redirect or rewrite for each request.
#[derive(Debug)]
pub struct TenantRouter {
    rewrite_prefix: String,
    exclusions: AnyMatcher,
    platform_hosts: Vec<String>,
    local_hosts: Vec<String>,
    local_min_segments: usize,
    canonical: CanonicalConfig,
    redirects: Vec<RedirectRule>,
    locale: LocaleConfig,
}

impl TenantRouter {
    /// Compile a router from validated configuration.
    pub fn from_config(config: &RouterConfig) -> Self {
        let lower = |hosts: &[String]| -> Vec<String> {
            hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect()
        };

        Self {
            rewrite_prefix: config.tenancy.rewrite_prefix.clone(),
            exclusions: AnyMatcher::from_config(&config.assets),
            platform_hosts: lower(&config.tenancy.platform_hosts),
            local_hosts: lower(&config.tenancy.local_hosts),
            local_min_segments: config.tenancy.local_min_segments.max(1),
            canonical: config.canonical.clone(),
            redirects: config.redirects.clone(),
            locale: config.locale.clone(),
        }
    }

    /// Decide what to do with a request.
    pub fn decide(&self, req: &RequestFacts<'_>) -> Decision {
        if self.exclusions.matches(req.path) {
            return Decision::pass(Reason::Excluded);
        }

        let Some(host) = req.host.and_then(Hostname::parse) else {
            return Decision::pass(Reason::NoHost);
        };

        if let Some(rule) = self.match_redirect(&host, req.path) {
            let location = if rule.preserve_path {
                preserve_path(&rule.destination, req)
            } else {
                rule.destination.clone()
            };
            return Decision::Redirect {
                location,
                permanent: rule.permanent,
                reason: Reason::RedirectRule,
            };
        }

        let local = host.is_local(&self.local_hosts);

        if self.canonical.strip_www && !local {
            if let Some(bare) = host.strip_www() {
                let scheme = if self.canonical.https { "https" } else { req.scheme };
                let port = host.port().map(|p| format!(":{p}")).unwrap_or_default();
                return Decision::Redirect {
                    location: format!("{scheme}://{bare}{port}{}", req.path_and_query()),
                    permanent: true,
                    reason: Reason::CanonicalHost,
                };
            }
        }

        if self.platform_hosts.iter().any(|h| h == host.as_str()) {
            return Decision::pass(Reason::PlatformHost);
        }

        let (target, reason) = if local {
            let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();
            if segments.len() < self.local_min_segments {
                return Decision::pass(Reason::LocalRoot);
            }
            (
                format!("{}/{}", self.rewrite_prefix, segments.join("/")),
                Reason::LocalTenant,
            )
        } else {
            (format!("{}/{}{}", self.rewrite_prefix, host, req.path), Reason::Tenant)
        };

        self.finish_rewrite(target, reason, req)
    }

    fn match_redirect(&self, host: &Hostname, path: &str) -> Option<&RedirectRule> {
        self.redirects.iter().find(|rule| {
            let host_ok = rule
                .host
                .as_deref()
                .map_or(true, |h| h.eq_ignore_ascii_case(host.as_str()));
            let path_ok = rule.path.as_deref().map_or(true, |p| p == path);
            host_ok && path_ok
        })
    }

    fn finish_rewrite(&self, target: String, reason: Reason, req: &RequestFacts<'_>) -> Decision {
        if !self.locale.enabled {
            return Decision::Rewrite {
                path_and_query: with_query(target, req.query),
                reason,
            };
        }

        let resolved = Locale::resolve(&self.locale, req.accept_language, req.country);
        match locale::inject(req.query, &self.locale, &resolved) {
            None => Decision::Rewrite {
                path_and_query: with_query(target, req.query),
                reason,
            },
            Some(query) => match self.locale.mode {
                LocaleMode::Rewrite => Decision::Rewrite {
                    path_and_query: with_query(target, Some(&query)),
                    reason,
                },
                LocaleMode::Redirect => Decision::Redirect {
                    location: with_query(req.path.to_string(), Some(&query)),
                    permanent: false,
                    reason: Reason::Locale,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> TenantRouter {
        TenantRouter::from_config(&RouterConfig::default())
    }

    fn rewrite_of(decision: Decision) -> String {
        match decision {
            Decision::Rewrite { path_and_query, .. } => path_and_query,
            other => panic!("expected rewrite, got {other:?}"),
        }
    }

    #[test]
    fn production_host_rewrites_under_host() {
        let router = router();
        let decision = router.decide(&RequestFacts::new(Some("acme.example.com"), "/john"));
        assert_eq!(
            decision,
            Decision::Rewrite {
                path_and_query: "/_sites/acme.example.com/john".into(),
                reason: Reason::Tenant,
            }
        );

        let root = router.decide(&RequestFacts::new(Some("Acme.com:443"), "/"));
        assert_eq!(rewrite_of(root), "/_sites/acme.com/");
    }

    #[test]
    fn local_host_rewrites_from_segments() {
        let router = router();
        let decision = router.decide(&RequestFacts::new(Some("localhost:3001"), "/acme/john/"));
        assert_eq!(
            decision,
            Decision::Rewrite {
                path_and_query: "/_sites/acme/john".into(),
                reason: Reason::LocalTenant,
            }
        );

        let decision = router.decide(&RequestFacts::new(Some("127.0.0.1:3000"), "//acme"));
        assert_eq!(rewrite_of(decision), "/_sites/acme");
    }

    #[test]
    fn local_root_passes_through() {
        let router = router();
        assert_eq!(
            router.decide(&RequestFacts::new(Some("localhost:3001"), "/")),
            Decision::pass(Reason::LocalRoot)
        );
    }

    #[test]
    fn local_min_segments_is_configurable() {
        let mut config = RouterConfig::default();
        config.tenancy.local_min_segments = 2;
        config.tenancy.rewrite_prefix = "/sites".into();
        let router = TenantRouter::from_config(&config);

        assert_eq!(
            router.decide(&RequestFacts::new(Some("localhost"), "/acme")),
            Decision::pass(Reason::LocalRoot)
        );
        assert_eq!(
            rewrite_of(router.decide(&RequestFacts::new(Some("localhost"), "/acme/john/posts"))),
            "/sites/acme/john/posts"
        );
    }

    #[test]
    fn assets_and_framework_paths_pass_through() {
        let router = router();
        for path in ["/_next/static/x.js", "/static/logo", "/a/b.png", "/favicon.ico", "/api/ping"] {
            assert_eq!(
                router.decide(&RequestFacts::new(Some("acme.com"), path)),
                Decision::pass(Reason::Excluded),
                "{path}"
            );
        }
    }

    #[test]
    fn missing_host_passes_through() {
        let router = router();
        assert_eq!(router.decide(&RequestFacts::new(None, "/john")), Decision::pass(Reason::NoHost));
        assert_eq!(router.decide(&RequestFacts::new(Some(""), "/john")), Decision::pass(Reason::NoHost));
    }

    #[test]
    fn malformed_host_never_reaches_rewrite_path() {
        let router = router();
        for host in ["a/../../admin", "victim.com?x=1", "acme.com/other", "acme.com#frag"] {
            assert_eq!(
                router.decide(&RequestFacts::new(Some(host), "/john")),
                Decision::pass(Reason::NoHost),
                "{host}"
            );
        }
    }

    #[test]
    fn platform_host_passes_through() {
        let mut config = RouterConfig::default();
        config.tenancy.platform_hosts = vec!["App.Example.com".into()];
        let router = TenantRouter::from_config(&config);

        assert_eq!(
            router.decide(&RequestFacts::new(Some("app.example.com"), "/pricing")),
            Decision::pass(Reason::PlatformHost)
        );
    }

    #[test]
    fn query_is_preserved_on_rewrite() {
        let router = router();
        let facts = RequestFacts::new(Some("acme.com"), "/john").with_query(Some("tab=posts"));
        assert_eq!(rewrite_of(router.decide(&facts)), "/_sites/acme.com/john?tab=posts");
    }

    #[test]
    fn www_is_canonicalized() {
        let mut config = RouterConfig::default();
        config.canonical.strip_www = true;
        let router = TenantRouter::from_config(&config);

        let facts = RequestFacts::new(Some("www.acme.com"), "/john")
            .with_scheme("https")
            .with_query(Some("a=1"));
        assert_eq!(
            router.decide(&facts),
            Decision::Redirect {
                location: "https://acme.com/john?a=1".into(),
                permanent: true,
                reason: Reason::CanonicalHost,
            }
        );

        config.canonical.https = true;
        let router = TenantRouter::from_config(&config);
        let facts = RequestFacts::new(Some("www.acme.com"), "/");
        match router.decide(&facts) {
            Decision::Redirect { location, .. } => assert_eq!(location, "https://acme.com/"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn www_redirect_keeps_port() {
        let mut config = RouterConfig::default();
        config.canonical.strip_www = true;
        let router = TenantRouter::from_config(&config);

        match router.decide(&RequestFacts::new(Some("www.acme.com:8080"), "/john")) {
            Decision::Redirect { location, .. } => assert_eq!(location, "http://acme.com:8080/john"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn redirect_rules_first_match_wins() {
        let mut config = RouterConfig::default();
        config.redirects = vec![
            RedirectRule {
                host: Some("old.acme.com".into()),
                path: None,
                destination: "https://acme.com/".into(),
                permanent: true,
                preserve_path: true,
            },
            RedirectRule {
                host: None,
                path: Some("/blog".into()),
                destination: "/posts".into(),
                permanent: false,
                preserve_path: false,
            },
        ];
        let router = TenantRouter::from_config(&config);

        let facts = RequestFacts::new(Some("OLD.acme.com"), "/blog").with_query(Some("p=1"));
        assert_eq!(
            router.decide(&facts),
            Decision::Redirect {
                location: "https://acme.com/blog?p=1".into(),
                permanent: true,
                reason: Reason::RedirectRule,
            }
        );

        let facts = RequestFacts::new(Some("acme.com"), "/blog");
        let decision = router.decide(&facts);
        assert_eq!(decision.redirect_status(), Some(axum::http::StatusCode::TEMPORARY_REDIRECT));
        assert_eq!(
            decision,
            Decision::Redirect {
                location: "/posts".into(),
                permanent: false,
                reason: Reason::RedirectRule,
            }
        );
    }

    #[test]
    fn preserved_path_merges_destination_query() {
        let mut config = RouterConfig::default();
        config.redirects = vec![RedirectRule {
            host: Some("old.acme.com".into()),
            path: None,
            destination: "https://x.com/?a=1".into(),
            permanent: true,
            preserve_path: true,
        }];
        let router = TenantRouter::from_config(&config);

        let facts = RequestFacts::new(Some("old.acme.com"), "/john").with_query(Some("b=2"));
        match router.decide(&facts) {
            Decision::Redirect { location, .. } => assert_eq!(location, "https://x.com/john?a=1&b=2"),
            other => panic!("unexpected {other:?}"),
        }

        let facts = RequestFacts::new(Some("old.acme.com"), "/john");
        match router.decide(&facts) {
            Decision::Redirect { location, .. } => assert_eq!(location, "https://x.com/john?a=1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn locale_params_injected_into_rewrite() {
        let mut config = RouterConfig::default();
        config.locale.enabled = true;
        let router = TenantRouter::from_config(&config);

        let facts = RequestFacts::new(Some("acme.com"), "/john")
            .with_accept_language(Some("de-AT,de;q=0.9"))
            .with_query(Some("tab=posts"));
        assert_eq!(
            rewrite_of(router.decide(&facts)),
            "/_sites/acme.com/john?tab=posts&lang=de&country=AT"
        );

        let facts = RequestFacts::new(Some("acme.com"), "/john").with_query(Some("lang=fr&country=FR"));
        assert_eq!(rewrite_of(router.decide(&facts)), "/_sites/acme.com/john?lang=fr&country=FR");
    }

    #[test]
    fn locale_redirect_mode() {
        let mut config = RouterConfig::default();
        config.locale.enabled = true;
        config.locale.mode = LocaleMode::Redirect;
        let router = TenantRouter::from_config(&config);

        let facts = RequestFacts::new(Some("acme.com"), "/john").with_country(Some("gb"));
        assert_eq!(
            router.decide(&facts),
            Decision::Redirect {
                location: "/john?lang=en&country=GB".into(),
                permanent: false,
                reason: Reason::Locale,
            }
        );

        // Once both are present the request is rewritten.
        let facts = RequestFacts::new(Some("acme.com"), "/john").with_query(Some("lang=en&country=GB"));
        assert_eq!(rewrite_of(router.decide(&facts)), "/_sites/acme.com/john?lang=en&country=GB");
    }
}
