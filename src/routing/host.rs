//! Hostname normalization.

use std::fmt;

/// A lowercased hostname with its port split off.
///
/// Only `[a-z0-9.-]` names and bracketed IPv6 literals are accepted, since
/// the name ends up inside a rewritten path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hostname {
    name: String,
    port: Option<u16>,
}

impl Hostname {
    /// Normalize a `Host` header or URI authority.
    ///
    /// Returns `None` for empty input or anything that is not a plain host.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();

        let (name, port) = if raw.starts_with('[') {
            let end = raw.find(']')?;
            let (literal, rest) = raw.split_at(end + 1);
            let inner = &literal[1..literal.len() - 1];
            if inner.is_empty() || !inner.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.') {
                return None;
            }
            let port = match rest {
                "" => None,
                rest => Some(parse_port(rest.strip_prefix(':')?)?),
            };
            (literal.to_string(), port)
        } else {
            let (name, port) = match raw.rsplit_once(':') {
                Some((name, port)) => (name, Some(parse_port(port)?)),
                None => (raw.as_str(), None),
            };
            let name = name.trim_end_matches('.');
            if !name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
            {
                return None;
            }
            (name.to_string(), port)
        };

        if name.is_empty() {
            None
        } else {
            Some(Self { name, port })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Local development hosts: anything containing `localhost`, plus the
    /// configured extras (compared case-insensitively).
    pub fn is_local(&self, local_hosts: &[String]) -> bool {
        self.name.contains("localhost")
            || local_hosts.iter().any(|h| h.eq_ignore_ascii_case(&self.name))
    }

    /// The name without a leading `www.`, if it had one.
    pub fn strip_www(&self) -> Option<&str> {
        self.name.strip_prefix("www.").filter(|rest| !rest.is_empty())
    }
}

fn parse_port(port: &str) -> Option<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse().ok()
}

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
