//! Static provider defaults

use serde::Serialize;

use super::Provider;

/// Defaults for a provider, used whenever a stored setting is absent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub base_url: &'static str,
    pub default_model: &'static str,
    pub available_models: &'static [&'static str],
    pub help_text: &'static str,
}

const OPENAI: ProviderConfig = ProviderConfig {
    base_url: "https://api.openai.com/v1/chat/completions",
    default_model: "gpt-4o-mini",
    available_models: &["gpt-4o-mini", "gpt-4o", "gpt-4-turbo", "gpt-3.5-turbo"],
    help_text: "OpenAI API key from https://platform.openai.com/api-keys",
};

const GROK: ProviderConfig = ProviderConfig {
    base_url: "https://api.x.ai/v1/chat/completions",
    default_model: "grok-2-latest",
    available_models: &["grok-2-latest", "grok-beta"],
    help_text: "X.AI API key from https://console.x.ai",
};

const OLLAMA: ProviderConfig = ProviderConfig {
    base_url: "http://localhost:11434/api/generate",
    default_model: "llama2",
    available_models: &[],
    help_text: "Local Ollama server, no API key needed. Models are discovered from /api/tags",
};

const DEEPSEEK: ProviderConfig = ProviderConfig {
    base_url: "https://api.deepseek.com/v1/chat/completions",
    default_model: "deepseek-chat",
    available_models: &["deepseek-chat", "deepseek-reasoner"],
    help_text: "DeepSeek API key from https://platform.deepseek.com",
};

const ANTHROPIC: ProviderConfig = ProviderConfig {
    base_url: "https://api.anthropic.com/v1/messages",
    default_model: "claude-3-5-sonnet-20241022",
    available_models: &[
        "claude-3-5-sonnet-20241022",
        "claude-3-5-haiku-20241022",
        "claude-3-opus-20240229",
    ],
    help_text: "Anthropic API key from https://console.anthropic.com",
};

const GOOGLE: ProviderConfig = ProviderConfig {
    base_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent",
    default_model: "",
    available_models: &["gemini-1.5-flash", "gemini-1.5-pro"],
    help_text: "Google AI Studio key. The model is part of the URL path",
};

const CUSTOM: ProviderConfig = ProviderConfig {
    base_url: "",
    default_model: "",
    available_models: &[],
    help_text: "Any OpenAI-compatible chat completions endpoint. API key is optional",
};

/// Look up the static defaults for a provider
pub fn lookup(provider: Provider) -> &'static ProviderConfig {
    match provider {
        Provider::OpenAi => &OPENAI,
        Provider::Grok => &GROK,
        Provider::Ollama => &OLLAMA,
        Provider::DeepSeek => &DEEPSEEK,
        Provider::Anthropic => &ANTHROPIC,
        Provider::Google => &GOOGLE,
        Provider::Custom => &CUSTOM,
    }
}
