//! LLM provider identities and their static defaults

mod registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use registry::{lookup, ProviderConfig};

/// Every upstream API the relay knows how to talk to.
///
/// The identity is fixed per request and drives request construction
/// (see [`crate::request`]) and response extraction (see [`crate::extract`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Grok,
    Ollama,
    DeepSeek,
    Anthropic,
    Google,
    Custom,
}

impl Provider {
    /// All providers in declaration order
    pub const ALL: [Provider; 7] = [
        Provider::OpenAi,
        Provider::Grok,
        Provider::Ollama,
        Provider::DeepSeek,
        Provider::Anthropic,
        Provider::Google,
        Provider::Custom,
    ];

    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Grok => "grok",
            Provider::Ollama => "ollama",
            Provider::DeepSeek => "deepseek",
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::Custom => "custom",
        }
    }

    /// Local inference server speaking the simple-completion wire shape
    pub fn is_local(&self) -> bool {
        matches!(self, Provider::Ollama)
    }

    /// Whether a request may go out without a model name.
    ///
    /// Custom endpoints and Google carry the model in the URL path.
    pub fn allows_empty_model(&self) -> bool {
        matches!(self, Provider::Custom | Provider::Google)
    }

    /// Whether an API key must be configured before any network call
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Provider::Ollama | Provider::Custom)
    }

    /// Static defaults for this provider
    pub fn config(&self) -> &'static ProviderConfig {
        lookup(*self)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown provider '{0}'. Supported: openai, grok, ollama, deepseek, anthropic, google, custom")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}
