//! Generated-text extraction from provider responses
//!
//! Each provider has its own response path; when that yields nothing a
//! generic list of known shapes is tried. A successful response that matches
//! no shape is never swallowed: the raw JSON comes back as diagnostic text.

use serde_json::Value;

use crate::api::error_message;
use crate::providers::Provider;

/// Text pulled out of a provider response
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    /// Nothing matched; `text` holds the raw response for inspection
    pub diagnostic: bool,
}

/// The upstream body itself reported an error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{provider} API error: {message}")]
pub struct ExtractError {
    pub provider: Provider,
    pub message: String,
}

/// Extract generated text from `body` using `provider`'s strategy
pub fn extract_content(provider: Provider, body: &Value) -> Result<Extraction, ExtractError> {
    if has_error_field(body) {
        let message = error_message(body).unwrap_or_else(|| body.to_string());
        return Err(ExtractError { provider, message });
    }

    let found = provider_specific(provider, body).or_else(|| generic_fallback(body));

    match found {
        Some(text) => Ok(Extraction {
            text,
            diagnostic: false,
        }),
        // An empty Gemini candidate can be a legitimate safety-filtered result
        None if provider == Provider::Google => {
            tracing::debug!("Google response carried no text; treating as filtered output");
            Ok(Extraction {
                text: String::new(),
                diagnostic: false,
            })
        }
        None => {
            tracing::warn!(
                provider = %provider,
                body_preview = %preview(body),
                "No content matched any known response shape"
            );
            Ok(Extraction {
                text: diagnostic_text(provider, body),
                diagnostic: true,
            })
        }
    }
}

fn has_error_field(body: &Value) -> bool {
    body.get("error").map(|e| !e.is_null()).unwrap_or(false)
}

fn provider_specific(provider: Provider, body: &Value) -> Option<String> {
    match provider {
        Provider::OpenAi | Provider::Grok | Provider::DeepSeek | Provider::Custom => {
            text_at(body, "/choices/0/message/content")
        }
        Provider::Ollama => text_at(body, "/response").or_else(|| text_at(body, "/message/content")),
        Provider::Anthropic => match body.get("content") {
            Some(Value::Array(_)) => text_at(body, "/content/0/text"),
            Some(Value::String(s)) => non_empty(s),
            _ => None,
        },
        Provider::Google => text_at(body, "/candidates/0/content/parts/0/text"),
    }
}

/// Shapes tried, in order, when the provider's own path comes up empty
const FALLBACK_PATHS: [&str; 5] = [
    "/choices/0/message/content",
    "/message/content",
    "/content",
    "/response",
    "/text",
];

fn generic_fallback(body: &Value) -> Option<String> {
    FALLBACK_PATHS
        .iter()
        .find_map(|path| text_at(body, path))
        .or_else(|| body.as_str().and_then(non_empty))
}

fn text_at(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer).and_then(|v| v.as_str()).and_then(non_empty)
}

/// Only `""` counts as missing; whitespace the model produced is kept
fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn diagnostic_text(provider: Provider, body: &Value) -> String {
    let raw = serde_json::to_string_pretty(body).unwrap_or_else(|_| body.to_string());
    format!(
        "No generated text could be found in the {} response. Raw response:\n\n```json\n{}\n```",
        provider, raw
    )
}

fn preview(body: &Value) -> String {
    let text = body.to_string();
    match text.char_indices().nth(300) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
