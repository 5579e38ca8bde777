//! Locale and country resolution for query-parameter injection.
//!
//! The language comes from the first usable `Accept-Language` tag. The
//! country comes from an edge-provided header (e.g. `cf-ipcountry`), then
//! the region subtag of that same tag, then the configured default.

use serde::Serialize;
use url::form_urlencoded;

use crate::config::LocaleConfig;

/// Resolved locale for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locale {
    pub language: String,
    pub country: String,
}

impl Locale {
    /// Resolve from request hints, falling back to the configured defaults.
    pub fn resolve(
        config: &LocaleConfig,
        accept_language: Option<&str>,
        country_hint: Option<&str>,
    ) -> Self {
        let tag = accept_language.and_then(first_language_tag);

        let language = tag
            .and_then(primary_subtag)
            .unwrap_or_else(|| config.default_language.to_ascii_lowercase());

        let country = country_hint
            .and_then(country_code)
            .or_else(|| tag.and_then(region_subtag))
            .unwrap_or_else(|| config.default_country.to_ascii_uppercase());

        Self { language, country }
    }
}

/// First tag of an `Accept-Language` value, ignoring `*` and q-weights.
fn first_language_tag(header: &str) -> Option<&str> {
    header
        .split(',')
        .filter_map(|part| part.split(';').next())
        .map(str::trim)
        .find(|tag| !tag.is_empty() && *tag != "*")
}

fn primary_subtag(tag: &str) -> Option<String> {
    let primary = tag.split(['-', '_']).next()?;
    (1..=8)
        .contains(&primary.len())
        .then_some(primary)
        .filter(|p| p.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_ascii_lowercase)
}

fn region_subtag(tag: &str) -> Option<String> {
    tag.split(['-', '_']).skip(1).find_map(country_code)
}

/// A two-letter country code, uppercased. `XX` (unknown) is rejected.
pub fn country_code(value: &str) -> Option<String> {
    let value = value.trim();
    if value.len() == 2 && value.chars().all(|c| c.is_ascii_alphabetic()) {
        let code = value.to_ascii_uppercase();
        (code != "XX").then_some(code)
    } else {
        None
    }
}

/// Append the locale parameters the query is missing.
///
/// Returns `None` when both parameters are already present. Existing values
/// are never replaced.
pub fn inject(query: Option<&str>, config: &LocaleConfig, locale: &Locale) -> Option<String> {
    let query = query.unwrap_or_default();
    let mut has_language = false;
    let mut has_country = false;
    for (key, _) in form_urlencoded::parse(query.as_bytes()) {
        if key == config.language_param.as_str() {
            has_language = true;
        } else if key == config.country_param.as_str() {
            has_country = true;
        }
    }

    if has_language && has_country {
        return None;
    }

    let mut serializer = form_urlencoded::Serializer::new(query.to_string());
    if !has_language {
        serializer.append_pair(&config.language_param, &locale.language);
    }
    if !has_country {
        serializer.append_pair(&config.country_param, &locale.country);
    }
    Some(serializer.finish())
}
