//! Provider wire payloads
//!
//! Shapes are fixed by the respective public APIs (OpenAI-compatible chat,
//! Anthropic messages, Gemini generateContent, Ollama generate).

use serde::{Deserialize, Serialize};

/// Chat message
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request (OpenAI, Grok, DeepSeek, custom, and Anthropic
/// with `max_tokens`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Ollama `/api/generate` request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// Gemini `generateContent` request
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
    pub generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiGenerationConfig {
    pub temperature: f32,
}

impl GeminiRequest {
    /// Single-turn request holding one text part
    pub fn from_prompt(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.into() }],
            }],
            generation_config: GeminiGenerationConfig { temperature },
        }
    }
}
