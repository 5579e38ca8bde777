//! Tenant routing middleware.
//!
//! Runs the routing decision for every request, answers redirects directly,
//! rewrites the URI for tenant routes, and makes sure the client ends up
//! with a session cookie whatever the outcome.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode, Uri};
use axum::middleware::Next;

use crate::config::RouterConfig;
use crate::http::request::{request_facts, request_host, request_id, request_scheme};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::{Decision, TenantRouter};
use crate::security::headers::{set_forwarded, X_ORIGINAL_URI};
use crate::session::{Session, SessionPolicy, X_SESSION_ID};

/// Everything compiled from one configuration generation.
#[derive(Debug)]
pub struct RouteContext {
    pub router: TenantRouter,
    pub sessions: SessionPolicy,
    pub country_headers: Vec<HeaderName>,
}

impl RouteContext {
    pub fn from_config(config: &RouterConfig) -> Self {
        let country_headers = config
            .locale
            .country_headers
            .iter()
            .filter_map(|name| match HeaderName::from_bytes(name.as_bytes()) {
                Ok(name) => Some(name),
                Err(_) => {
                    tracing::warn!(header = %name, "Ignoring invalid country header name");
                    None
                }
            })
            .collect();

        Self {
            router: TenantRouter::from_config(config),
            sessions: SessionPolicy::from_config(config),
            country_headers,
        }
    }
}

/// Shared, hot-swappable routing state.
pub type SharedRoutes = Arc<ArcSwap<RouteContext>>;

pub async fn tenant_routing_middleware(
    State(routes): State<SharedRoutes>,
    mut request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let start = Instant::now();
    let ctx = routes.load_full();

    let decision = ctx.router.decide(&request_facts(&request, &ctx.country_headers));
    let session = ctx.sessions.resolve(request.headers());

    tracing::debug!(
        request_id = %request_id(&request),
        host = ?request_host(&request),
        path = %request.uri().path(),
        outcome = decision.outcome(),
        reason = decision.reason().as_str(),
        session_issued = session.issued,
        "Routing decision"
    );
    metrics::record_decision(&decision);

    let mut response = match &decision {
        Decision::Redirect { location, .. } => response::redirect(
            location,
            decision.redirect_status().unwrap_or(StatusCode::TEMPORARY_REDIRECT),
        ),
        Decision::PassThrough { .. } => {
            prepare_upstream(&mut request, &session);
            next.run(request).await
        }
        Decision::Rewrite { path_and_query, .. } => {
            prepare_upstream(&mut request, &session);
            if let Err(e) = rewrite_uri(&mut request, path_and_query) {
                tracing::error!(
                    request_id = %request_id(&request),
                    target = %path_and_query,
                    error = %e,
                    "Rewrite target is not a valid URI; forwarding unchanged"
                );
            }
            next.run(request).await
        }
    };

    if session.issued {
        match ctx.sessions.set_cookie(&session.id) {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
                metrics::record_session_issued();
            }
            Err(e) => tracing::error!(error = %e, "Failed to build session cookie"),
        }
    }

    metrics::record_duration(start);
    response
}

/// Forwarding headers and the session id, shared by pass-through and rewrite.
fn prepare_upstream(request: &mut Request<Body>, session: &Session) {
    let host = request_host(request).map(str::to_string);
    let scheme = request_scheme(request).to_string();
    set_forwarded(request.headers_mut(), host.as_deref(), &scheme);

    if let Ok(value) = HeaderValue::from_str(&session.id) {
        request.headers_mut().insert(X_SESSION_ID, value);
    }
    request.extensions_mut().insert(session.clone());
}

/// Replace the path-and-query, keeping scheme and authority.
fn rewrite_uri(request: &mut Request<Body>, target: &str) -> Result<(), axum::http::Error> {
    let original = request
        .uri()
        .path_and_query()
        .map(PathAndQuery::as_str)
        .unwrap_or("/")
        .to_string();

    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(target.parse::<PathAndQuery>()?);
    *request.uri_mut() = Uri::from_parts(parts)?;

    if let Ok(value) = HeaderValue::from_str(&original) {
        request.headers_mut().insert(X_ORIGINAL_URI, value);
    }
    Ok(())
}
