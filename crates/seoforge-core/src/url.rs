//! URL and path helpers shared by context building, merging and rendering.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defaults;

static HAS_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());
static SINGLE_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(https?):/([^/])").unwrap());
static NO_SLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(https?):([^/])").unwrap());
static REPEATED_SLASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"/{2,}").unwrap());

/// Whether `value` starts with `http://` or `https://`.
pub fn is_absolute(value: &str) -> bool {
    HAS_SCHEME.is_match(value)
}

/// Repair common scheme typos: `https:/x` and `https:x` become `https://x`,
/// protocol-relative `//x` becomes `https://x`.
pub fn ensure_protocol(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_absolute(trimmed) {
        return trimmed.to_string();
    }
    if SINGLE_SLASH.is_match(trimmed) {
        return SINGLE_SLASH.replace(trimmed, "$1://$2").into_owned();
    }
    if NO_SLASH.is_match(trimmed) {
        return NO_SLASH.replace(trimmed, "$1://$2").into_owned();
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return format!("https://{}", rest);
    }
    trimmed.to_string()
}

/// Protocol-repaired URL without trailing slashes.
pub fn sanitize_base_url(value: &str) -> String {
    ensure_protocol(value).trim_end_matches('/').to_string()
}

/// Prefix a relative URL with `base`. Absolute URLs pass through; without a
/// base the value is returned unchanged.
pub fn ensure_absolute_url(value: &str, base: Option<&str>) -> String {
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }
    match base.filter(|b| !b.is_empty()) {
        Some(base) if value.starts_with('/') => format!("{}{}", base, value),
        Some(base) => format!("{}/{}", base, value),
        None => value.to_string(),
    }
}

/// Absolutize against `base` and accept only `http(s)://` results.
pub fn normalize_absolute_url(value: &str, base: Option<&str>) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let candidate = ensure_absolute_url(value, base);
    is_absolute(&candidate).then_some(candidate)
}

/// Canonical path for an entity.
///
/// Pages addressed by an empty slug or a home alias map to `/`; otherwise
/// `base_path + "/" + slug` with duplicate slashes collapsed.
pub fn canonical_path(base_path: &str, slug: &str, is_page: bool) -> String {
    let base = base_path.trim();
    let base = if base.is_empty() { "/" } else { base };
    let base = base.trim_end_matches('/');
    let slug = slug.trim();

    if is_page && (slug.is_empty() || defaults::HOME_SLUGS.contains(&slug)) {
        return "/".to_string();
    }
    if slug.is_empty() {
        return if base.is_empty() { "/".to_string() } else { base.to_string() };
    }

    let slug = if slug.starts_with('/') {
        slug.to_string()
    } else {
        format!("/{}", slug)
    };
    let full = REPEATED_SLASHES
        .replace_all(&format!("{}{}", base, slug), "/")
        .into_owned();
    if full.is_empty() {
        "/".to_string()
    } else {
        full
    }
}

/// `scheme://host[:port]` of an absolute URL.
pub fn origin_of(value: &str) -> Option<String> {
    if !is_absolute(value) {
        return None;
    }
    let scheme_end = value.find("://")? + 3;
    let rest = &value[scheme_end..];
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = &rest[..host_end];
    if host.is_empty() {
        return None;
    }
    Some(format!("{}{}", &value[..scheme_end], host))
}
