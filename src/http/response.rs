//! Responses produced by the router itself.
//!
//! Redirects are answered directly; upstream failures are mapped to
//! gateway errors. Everything else is the upstream's response.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;

/// A redirect to `location` with the given 3xx status.
pub fn redirect(location: &str, status: StatusCode) -> Response<Body> {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        Err(_) => {
            tracing::error!(location = %location, "Redirect location is not a valid header value");
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect target").into_response()
        }
    }
}

pub fn bad_gateway() -> Response<Body> {
    (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
}

pub fn gateway_timeout() -> Response<Body> {
    (StatusCode::GATEWAY_TIMEOUT, "Upstream timed out").into_response()
}
