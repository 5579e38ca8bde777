//! Request inspection.
//!
//! # Responsibilities
//! - Generate and propagate a unique request ID (UUID v4)
//! - Extract routing-relevant information (host, scheme, path, locale hints)

use axum::body::Body;
use axum::http::{HeaderName, Request};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::locale::country_code;
use crate::routing::RequestFacts;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer that assigns an `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// The request ID, or `"unknown"` when the ID layer did not run.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

fn header_str<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Host the client asked for: `Host` header first, then the URI authority.
pub fn request_host(request: &Request<Body>) -> Option<&str> {
    header_str(request, "host").or_else(|| request.uri().host())
}

/// Scheme the client used, honoring `x-forwarded-proto` from a fronting proxy.
pub fn request_scheme(request: &Request<Body>) -> &str {
    header_str(request, "x-forwarded-proto")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| v.eq_ignore_ascii_case("http") || v.eq_ignore_ascii_case("https"))
        .or_else(|| request.uri().scheme_str())
        .unwrap_or("http")
}

/// Collect the facts the tenant router decides on.
pub fn request_facts<'a>(
    request: &'a Request<Body>,
    country_headers: &[HeaderName],
) -> RequestFacts<'a> {
    let country = country_headers.iter().find_map(|name| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| country_code(v).is_some())
    });

    RequestFacts::new(request_host(request), request.uri().path())
        .with_scheme(request_scheme(request))
        .with_query(request.uri().query())
        .with_accept_language(header_str(request, "accept-language"))
        .with_country(country)
}
