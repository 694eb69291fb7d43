//! Provider-specific request construction
//!
//! Turns a resolved provider and a prompt into the URL, JSON body, and
//! headers that provider's API expects. Validation of the resolved values
//! happens here, before anything touches the network.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::api::{ChatCompletionRequest, GeminiRequest, GenerateRequest, Message};
use crate::providers::Provider;
use crate::relay::{redact, redact_headers};
use crate::settings::ResolvedProvider;

/// Sampling temperature sent to every provider
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// `max_tokens` is mandatory on the Anthropic messages API
pub const ANTHROPIC_MAX_TOKENS: u32 = 4096;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Placeholder a Google URL may carry in place of the model name
const MODEL_PLACEHOLDER: &str = "{model}";

/// A request ready to hand to the relay
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub url: String,
    pub body: Value,
    pub headers: BTreeMap<String, String>,
    /// Ollama's `{model, prompt}` generate shape rather than chat messages
    pub simple_completion: bool,
}

/// Configuration problems detected before any network call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("No API URL configured for provider '{0}'")]
    MissingUrl(Provider),

    #[error("No model configured for provider '{0}'")]
    MissingModel(Provider),

    #[error("An API key is required for provider '{0}'")]
    MissingApiKey(Provider),
}

/// Build the wire request for `target` carrying `prompt`
pub fn build_request(target: &ResolvedProvider, prompt: &str) -> Result<ProviderRequest, BuildError> {
    let provider = target.provider;

    if target.url.trim().is_empty() {
        return Err(BuildError::MissingUrl(provider));
    }
    if target.model.trim().is_empty() && !provider.allows_empty_model() {
        return Err(BuildError::MissingModel(provider));
    }
    let api_key = target.api_key.as_deref().filter(|k| !k.trim().is_empty());
    if provider.requires_api_key() && api_key.is_none() {
        return Err(BuildError::MissingApiKey(provider));
    }

    let (body, simple_completion) = build_body(provider, &target.model, prompt);
    let headers = build_headers(provider, api_key);
    let url = build_url(provider, &target.url, &target.model);

    tracing::debug!(
        provider = %provider,
        url = %redact(&url),
        model = %target.model,
        simple_completion = simple_completion,
        headers = %redact_headers(&headers),
        "Built provider request"
    );

    Ok(ProviderRequest {
        url,
        body,
        headers,
        simple_completion,
    })
}

fn build_body(provider: Provider, model: &str, prompt: &str) -> (Value, bool) {
    let chat = |max_tokens: Option<u32>| ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![Message::user(prompt)],
        temperature: DEFAULT_TEMPERATURE,
        stream: false,
        max_tokens,
    };

    let (body, simple) = match provider {
        Provider::OpenAi | Provider::Grok | Provider::DeepSeek | Provider::Custom => {
            (serde_json::to_value(chat(None)), false)
        }
        Provider::Anthropic => (serde_json::to_value(chat(Some(ANTHROPIC_MAX_TOKENS))), false),
        Provider::Google => (
            serde_json::to_value(GeminiRequest::from_prompt(prompt, DEFAULT_TEMPERATURE)),
            false,
        ),
        Provider::Ollama => (
            serde_json::to_value(GenerateRequest {
                model: model.to_string(),
                prompt: prompt.to_string(),
                stream: false,
            }),
            true,
        ),
    };

    // These structs hold only strings, numbers and bools
    (body.unwrap_or(Value::Null), simple)
}

fn build_headers(provider: Provider, api_key: Option<&str>) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    if provider.is_local() {
        return headers;
    }

    if let Some(key) = api_key {
        headers.insert("Authorization".to_string(), format!("Bearer {}", key));

        match provider {
            Provider::Anthropic => {
                headers.insert("x-api-key".to_string(), key.to_string());
                headers.insert("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string());
            }
            Provider::Google => {
                headers.insert("x-goog-api-key".to_string(), key.to_string());
            }
            Provider::OpenAi | Provider::Grok | Provider::DeepSeek | Provider::Custom | Provider::Ollama => {}
        }
    }

    headers
}

fn build_url(provider: Provider, url: &str, model: &str) -> String {
    let url = url.trim();
    if provider == Provider::Google && !model.is_empty() && url.contains(MODEL_PLACEHOLDER) {
        return url.replace(MODEL_PLACEHOLDER, model);
    }
    url.to_string()
}
