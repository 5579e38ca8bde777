//! Forwarding to the upstream application.
//!
//! # Responsibilities
//! - Point the (possibly rewritten) request at the upstream address
//! - Strip hop-by-hop headers in both directions
//! - Map connection failures to 502 and slow upstreams to 504
//!
//! The `Host` header is left untouched so the application still sees the
//! tenant's hostname.

use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::RouterConfig;
use crate::http::request::request_id;
use crate::http::response;
use crate::observability::metrics;
use crate::security::headers::strip_hop_by_hop;

/// HTTP client bound to one upstream.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    authority: Authority,
    timeout: Duration,
}

impl Forwarder {
    /// Build a forwarder for `upstream.address`.
    pub fn new(config: &RouterConfig) -> Result<Self, axum::http::uri::InvalidUri> {
        let authority = Authority::from_str(&config.upstream.address)?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(
            config.upstream.connect_timeout_secs,
        )));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            authority,
            timeout: Duration::from_secs(config.timeouts.request_secs),
        })
    }

    /// Send the request upstream and relay the response.
    pub async fn forward(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let request_id = request_id(&request).to_string();
        let (mut parts, body) = request.into_parts();

        strip_hop_by_hop(&mut parts.headers);

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = match Uri::from_parts(uri_parts) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
                return response::bad_gateway();
            }
        };

        let request = Request::from_parts(parts, body);
        match tokio::time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(upstream)) => {
                let status = upstream.status();
                metrics::record_upstream(status.as_u16(), start);

                let (mut parts, body) = upstream.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Ok(Err(e)) => {
                tracing::error!(
                    request_id = %request_id,
                    upstream = %self.authority,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_upstream(502, start);
                response::bad_gateway()
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    upstream = %self.authority,
                    timeout = ?self.timeout,
                    "Upstream timed out"
                );
                metrics::record_upstream(504, start);
                response::gateway_timeout()
            }
        }
    }
}
