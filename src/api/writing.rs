//! Writing and polishing request/response shapes

use serde::{Deserialize, Serialize};

use crate::prompt::PromptStyle;
use crate::providers::Provider;

/// Generation request built from the writing form
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingRequest {
    #[serde(default)]
    pub prompt_style: PromptStyle,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub word_count: u32,
    #[serde(default)]
    pub llm_api_url: String,
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default)]
    pub model: String,
    pub api_provider: Provider,
}

/// Polishing flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolishType {
    #[default]
    Standard,
    Academic,
    Business,
    Creative,
}

impl std::str::FromStr for PolishType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(PolishType::Standard),
            "academic" => Ok(PolishType::Academic),
            "business" => Ok(PolishType::Business),
            "creative" => Ok(PolishType::Creative),
            other => Err(format!(
                "Unknown polish type '{}'. Supported: standard, academic, business, creative",
                other
            )),
        }
    }
}

/// Polishing request
///
/// `api_provider` is optional; without it the endpoint is treated as an
/// OpenAI-compatible custom endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolishRequest {
    pub original_text: String,
    #[serde(default)]
    pub llm_api_url: String,
    #[serde(default)]
    pub llm_api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub polish_type: PolishType,
    #[serde(default)]
    pub api_provider: Option<Provider>,
}

/// Result of a generation
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ApiResponse {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Result of a polish, with optional diff markup against the original
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolishResponse {
    pub polished_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_markup: Option<String>,
}

impl PolishResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            polished_text: String::new(),
            error: Some(error.into()),
            diff_markup: None,
        }
    }
}
