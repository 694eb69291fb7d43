//! Generation and polish pipeline
//!
//! resolve settings -> build prompt -> build request -> relay -> extract.
//! Every failure is folded into the response's `error` field; nothing
//! escapes as a Rust error past this boundary.

mod transport;

use std::sync::Arc;

use crate::api::{ApiResponse, PolishRequest, PolishResponse, RelayReply, RelayRequest, WritingRequest};
use crate::diff::diff_markup;
use crate::extract::{extract_content, ExtractError, Extraction};
use crate::prompt::{format_polish_prompt, format_prompt};
use crate::providers::Provider;
use crate::relay::redact;
use crate::request::{build_request, BuildError, ProviderRequest};
use crate::settings::{resolve, ProviderOverrides, SettingsHandle};

pub use transport::{HttpTransport, InProcessTransport, RelayTransport};

/// Why a generation produced no content
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Missing URL, model or key; caught before any network call
    #[error("Configuration error: {0}")]
    Config(#[from] BuildError),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("{0}")]
    InvalidInput(String),
}

/// Runs the full pipeline for generation and polish requests
pub struct GenerationClient {
    transport: Arc<dyn RelayTransport>,
    settings: Arc<SettingsHandle>,
}

impl GenerationClient {
    pub fn new(transport: Arc<dyn RelayTransport>, settings: Arc<SettingsHandle>) -> Self {
        Self { transport, settings }
    }

    /// Generate an article from structured writing parameters
    pub async fn generate(&self, request: &WritingRequest) -> ApiResponse {
        let prompt = format_prompt(
            &request.prompt_style,
            &request.topic,
            &request.keywords,
            request.word_count,
        );
        let overrides = ProviderOverrides::from_fields(&request.llm_api_url, &request.llm_api_key, &request.model);

        match self.run(request.api_provider, &overrides, &prompt).await {
            Ok(extraction) => ApiResponse::ok(extraction.text),
            Err(e) => {
                tracing::warn!(provider = %request.api_provider, error = %redact(&e.to_string()), "Generation failed");
                ApiResponse::failed(e.to_string())
            }
        }
    }

    /// Polish existing text; on success the diff against the original is attached
    pub async fn polish(&self, request: &PolishRequest) -> PolishResponse {
        if request.original_text.trim().is_empty() {
            return PolishResponse::failed("Original text is empty");
        }

        let provider = request.api_provider.unwrap_or(Provider::Custom);
        let prompt = format_polish_prompt(request.polish_type, &request.original_text);
        let overrides = ProviderOverrides::from_fields(&request.llm_api_url, &request.llm_api_key, &request.model);

        match self.run(provider, &overrides, &prompt).await {
            Ok(extraction) => {
                let markup = diff_markup(&request.original_text, &extraction.text);
                PolishResponse {
                    polished_text: extraction.text,
                    error: None,
                    diff_markup: Some(markup),
                }
            }
            Err(e) => {
                tracing::warn!(provider = %provider, error = %redact(&e.to_string()), "Polish failed");
                PolishResponse::failed(e.to_string())
            }
        }
    }

    async fn run(
        &self,
        provider: Provider,
        overrides: &ProviderOverrides,
        prompt: &str,
    ) -> Result<Extraction, GenerationError> {
        let settings = self.settings.snapshot().await;
        let target = resolve(provider, overrides, &settings);
        let built = build_request(&target, prompt)?;

        tracing::info!(
            provider = %provider,
            model = %target.model,
            transport = self.transport.name(),
            prompt_chars = prompt.chars().count(),
            "Sending generation request"
        );

        let reply = self.transport.send(relay_envelope(built)).await?;
        let body = into_success_body(reply)?;

        let extraction = extract_content(provider, &body)?;
        if extraction.diagnostic {
            tracing::warn!(provider = %provider, "Returning raw response as diagnostic content");
        }
        Ok(extraction)
    }
}

fn relay_envelope(built: ProviderRequest) -> RelayRequest {
    RelayRequest {
        target_url: Some(built.url),
        headers: Some(built.headers),
        body: built.body,
    }
}

fn into_success_body(reply: RelayReply) -> Result<serde_json::Value, GenerationError> {
    if reply.is_success() {
        return Ok(reply.body);
    }

    let message = reply
        .error_message()
        .unwrap_or_else(|| reply.body.to_string());

    // a `stack` field marks a relay-side connection failure
    if reply.body.pointer("/error/stack").is_some() {
        return Err(GenerationError::Transport(message));
    }

    Err(GenerationError::Upstream {
        status: reply.status,
        message,
    })
}
