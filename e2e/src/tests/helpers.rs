//! Common test helpers and JSON builders

use serde_json::{json, Value};

use crate::types::{ReceivedRequest, RelayResponse};

// ─── Request builders ────────────────────────────────────────────────────────

/// `/api/proxy` envelope
pub fn relay_envelope(target_url: &str, headers: Value, body: Value) -> Value {
    json!({
        "targetUrl": target_url,
        "headers": headers,
        "body": body
    })
}

/// `/api/generate` body for the writing form
pub fn writing_request(provider: &str, url: &str, api_key: &str, model: &str) -> Value {
    json!({
        "promptStyle": {"emotion": {"tone": "wistful"}},
        "topic": "autumn rain",
        "keywords": ["leaves", "umbrella"],
        "wordCount": 300,
        "llmApiUrl": url,
        "llmApiKey": api_key,
        "model": model,
        "apiProvider": provider
    })
}

/// `/api/polish` body
pub fn polish_request(text: &str, url: &str, polish_type: &str) -> Value {
    json!({
        "originalText": text,
        "llmApiUrl": url,
        "llmApiKey": "",
        "model": "",
        "polishType": polish_type
    })
}

// ─── Response builders ────────────────────────────────────────────────────────

/// OpenAI-compatible chat completion body
pub fn chat_completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-test001",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
    .to_string()
}

/// OpenAI-style error envelope
pub fn error_body(message: &str) -> String {
    json!({"error": {"message": message, "type": "invalid_request_error"}}).to_string()
}

// ─── Assertions ───────────────────────────────────────────────────────────────

/// Assert two strings are equal, with context on failure
pub fn assert_eq_str(actual: &str, expected: &str, label: &str) -> anyhow::Result<()> {
    if actual != expected {
        Err(anyhow::anyhow!("{label}: expected {:?} but got {:?}", expected, actual))
    } else {
        Ok(())
    }
}

/// Assert condition is true, with message
pub fn assert_true(cond: bool, msg: &str) -> anyhow::Result<()> {
    if !cond {
        Err(anyhow::anyhow!("{}", msg))
    } else {
        Ok(())
    }
}

/// Assert the relay answered with the given status
pub fn assert_status(resp: &RelayResponse, expected: u16) -> anyhow::Result<()> {
    assert_true(
        resp.status == expected,
        &format!("Expected status {}, got {} (body: {})", expected, resp.status, resp.body),
    )
}

/// Fetch a string field or fail with the full body
pub fn require_str<'a>(resp: &'a RelayResponse, path: &str) -> anyhow::Result<&'a str> {
    resp.get_str(path)
        .ok_or_else(|| anyhow::anyhow!("Missing string at '{}' in {}", path, resp.body))
}

/// Exactly one backend request, or fail
pub fn single_request(mut reqs: Vec<ReceivedRequest>) -> anyhow::Result<ReceivedRequest> {
    assert_true(reqs.len() == 1, &format!("Expected 1 backend request, got {}", reqs.len()))?;
    reqs.pop().ok_or_else(|| anyhow::anyhow!("Backend received no request"))
}
