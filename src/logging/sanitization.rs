use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Replacement for every redacted value
pub const MASK: &str = "***";

/// Appended to bodies cut at the maximum payload length
pub const TRUNCATION_MARKER: &str = "...";

/// Header name fragments whose values are never logged
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "auth-key",
    "x-api-key",
    "api-key",
    "token",
    "x-auth-token",
    "x-access-token",
    "bearer",
    "cookie",
    "set-cookie",
];

/// Body field name fragments whose values are never logged
pub const SENSITIVE_BODY_KEYWORDS: &[&str] = &[
    "password",
    "secret",
    "key",
    "token",
    "auth",
    "credential",
];

/// Redaction patterns for outbound request logging
pub struct SanitizationPatterns {
    query_param: Option<Regex>,
    body_fields: Vec<Regex>,
}

static PATTERNS: OnceLock<SanitizationPatterns> = OnceLock::new();

/// Get compiled regex patterns for sanitization
pub fn get_patterns() -> &'static SanitizationPatterns {
    PATTERNS.get_or_init(|| SanitizationPatterns {
        // api_key, api-key, apikey, token, auth_key, auth-key, authkey, secret
        query_param: compile(r"(?i)([?&])(api[_-]?key|token|auth[_-]?key|secret)=([^&#]*)"),

        // "keyword": "value", 'keyword'='value', keyword=value, keyword: value
        body_fields: SENSITIVE_BODY_KEYWORDS
            .iter()
            .filter_map(|keyword| {
                compile(&format!(
                    r#"(?i)(["']?{}["']?\s*[:=]\s*["']?)([^"',}}&\s]+)(["']?)"#,
                    regex::escape(keyword)
                ))
            })
            .collect(),
    })
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::error!(error = %e, "Skipping sanitization pattern that failed to compile");
            None
        }
    }
}

/// Mask values of sensitive query parameters, keeping names and order.
pub fn sanitize_url(url: &str) -> String {
    match &get_patterns().query_param {
        Some(pattern) => pattern.replace_all(url, format!("${{1}}${{2}}={MASK}")).into_owned(),
        None => url.to_string(),
    }
}

/// Whether a header name contains one of the sensitive fragments
pub fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_HEADERS.iter().any(|fragment| name.contains(fragment))
}

/// Mask sensitive header values; every other value passes through untouched.
pub fn sanitize_header_pairs<'a, I>(headers: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut sanitized = BTreeMap::new();
    for (name, value) in headers {
        let value = if is_sensitive_header(name) { MASK } else { value };
        // First value wins for repeated headers
        sanitized.entry(name.to_string()).or_insert_with(|| value.to_string());
    }
    sanitized
}

/// Single-value view of a header map with sensitive values masked
pub fn sanitize_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let pairs: Vec<(&str, String)> = headers
        .iter()
        .map(|(name, value)| (name.as_str(), header_value_text(value)))
        .collect();

    sanitize_header_pairs(pairs.iter().map(|(name, value)| (*name, value.as_str())))
}

/// Single-value view of a header map, unmodified
pub fn header_values(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    for (name, value) in headers {
        values
            .entry(name.as_str().to_string())
            .or_insert_with(|| header_value_text(value));
    }
    values
}

/// Header value as text: verbatim when it is UTF-8, otherwise the escaped
/// `Debug` form so no byte is lost or replaced
fn header_value_text(value: &HeaderValue) -> String {
    match std::str::from_utf8(value.as_bytes()) {
        Ok(text) => text.to_string(),
        Err(_) => format!("{:?}", value),
    }
}

/// Mask values of sensitive fields in JSON or form-encoded text.
///
/// Textual and best effort: the input does not have to be valid JSON. Rules
/// are applied one keyword at a time, so output is always at least partially
/// redacted even when a rule is unavailable.
pub fn sanitize_body(body: &str) -> String {
    if body.trim().is_empty() {
        return body.to_string();
    }

    let replacement = format!("${{1}}{MASK}${{3}}");
    get_patterns()
        .body_fields
        .iter()
        .fold(body.to_string(), |sanitized, pattern| {
            pattern.replace_all(&sanitized, replacement.as_str()).into_owned()
        })
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_payload(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Sanitize (when enabled) then truncate a body for logging
pub fn loggable_body(body: &str, sanitize: bool, max_chars: usize) -> String {
    if sanitize {
        truncate_payload(&sanitize_body(body), max_chars)
    } else {
        truncate_payload(body, max_chars)
    }
}
