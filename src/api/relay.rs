//! Relay endpoint envelopes

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Body accepted by `POST /api/proxy`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub body: Value,
}

/// Status and JSON body returned by the relay
#[derive(Debug, Clone, PartialEq)]
pub struct RelayReply {
    pub status: u16,
    pub body: Value,
}

impl RelayReply {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// `{error:{message}}` envelope
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self::new(status, json!({ "error": { "message": message.into() } }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error message carried by an error envelope, if any
    pub fn error_message(&self) -> Option<String> {
        error_message(&self.body)
    }
}

/// Pull a human-readable message out of the common error shapes:
/// `{error:{message}}`, `{error:"..."}`, `{message:"..."}`
pub fn error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Object(obj)) => {
            if let Some(msg) = obj.get("message").and_then(|m| m.as_str()) {
                return Some(msg.to_string());
            }
            return Some(Value::Object(obj.clone()).to_string());
        }
        Some(Value::Null) | None => {}
        Some(other) => return Some(other.to_string()),
    }
    body.get("message")
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

/// Body accepted by `POST /api/proxy/ollama-models`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsRequest {
    #[serde(default)]
    pub ollama_url: Option<String>,
}

/// Flat model list returned by the model-list relay
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}
