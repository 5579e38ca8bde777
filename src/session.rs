//! Session identifier cookie.
//!
//! Every client gets a `session_id` cookie. Requests that arrive without one
//! are issued a fresh UUID v4 with a 7-day lifetime; the id is also forwarded
//! upstream so the application can use it on the first request.

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use uuid::Uuid;

use crate::config::RouterConfig;

/// Header carrying the session id to the upstream application.
pub const X_SESSION_ID: &str = "x-session-id";

/// The session of the current request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// True when the id was generated for this request.
    pub issued: bool,
}

/// Cookie attributes applied when issuing a session.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    cookie_name: String,
    max_age_secs: u64,
    secure: bool,
}

impl SessionPolicy {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            cookie_name: config.session.cookie_name.clone(),
            max_age_secs: config.session.max_age_secs,
            secure: config.cookie_secure(),
        }
    }

    /// The session id sent by the client, if any. Empty values count as absent.
    pub fn existing(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| name.trim() == self.cookie_name)
            .map(|(_, value)| value.trim().trim_matches('"').to_string())
            .filter(|value| !value.is_empty())
    }

    /// Reuse the client's session or issue a new one.
    pub fn resolve(&self, headers: &HeaderMap) -> Session {
        match self.existing(headers) {
            Some(id) => Session { id, issued: false },
            None => Session {
                id: Uuid::new_v4().to_string(),
                issued: true,
            },
        }
    }

    /// `Set-Cookie` value for a newly issued session.
    pub fn set_cookie(&self, id: &str) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
            self.cookie_name, id, self.max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
    }
}
