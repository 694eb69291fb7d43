//! Pattern-based redaction of credentials in log output
//!
//! Matching is by pattern rather than by the literal key value, so a key
//! that has been embedded in a larger serialized object is still caught.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const REDACTED: &str = "[REDACTED]";

const BEARER: &str = r"(?i)\b(bearer\s+)[A-Za-z0-9\-._~+/]+=*";
const JSON_FIELD: &str = r#"(?i)("(?:api[_-]?key|llmApiKey|x-api-key|x-goog-api-key|authorization|access_token|refresh_token|token|secret|password|credentials)"\s*:\s*")[^"]*(")"#;
const SECRET_KEY: &str = r"\b(sk-)[A-Za-z0-9_\-]{6,}";
const QUERY_PARAM: &str = r"(?i)([?&](?:key|api_key|apikey|access_token|token)=)[^&\s]+";

/// Compiled (pattern, replacement) pairs, applied in order
fn rules() -> &'static [(Regex, String)] {
    static RULES: OnceLock<Vec<(Regex, String)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (BEARER, format!("${{1}}{}", REDACTED)),
            (JSON_FIELD, format!("${{1}}{}${{2}}", REDACTED)),
            (SECRET_KEY, format!("${{1}}{}", REDACTED)),
            (QUERY_PARAM, format!("${{1}}{}", REDACTED)),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(re) => Some((re, replacement)),
            Err(e) => {
                tracing::error!(pattern = pattern, error = %e, "Invalid redaction pattern");
                None
            }
        })
        .collect()
    })
}

/// Replace anything that looks like a credential in `text`
pub fn redact(text: &str) -> String {
    rules()
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, replacement.as_str()).into_owned()
        })
}

/// Check if a header carries credentials outright
fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "authorization"
            | "proxy-authorization"
            | "x-api-key"
            | "x-goog-api-key"
            | "api-key"
            | "cookie"
            | "set-cookie"
            | "x-auth-token"
    )
}

/// Render headers for a log line with credential values replaced
pub fn redact_headers(headers: &BTreeMap<String, String>) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_sensitive_header(name) {
                REDACTED.to_string()
            } else {
                redact(value)
            };
            format!("{}={}", name, shown)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Truncate long strings for logging, on a char boundary
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let total = s.chars().count();
            format!("{}...[truncated {} chars]", &s[..idx], total - max_chars)
        }
        None => s.to_string(),
    }
}
