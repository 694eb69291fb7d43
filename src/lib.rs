//! scribe-relay: provider-adaptive LLM relay for a writing assistant
//!
//! Features:
//! - Same-origin relay of generation calls to OpenAI, Grok, DeepSeek,
//!   Anthropic, Google, Ollama or any OpenAI-compatible endpoint
//! - Prompt construction from structured writing styles
//! - Per-provider request shaping and response extraction
//! - Line diff markup for polished text
//! - Persistent per-provider settings

pub mod api;
pub mod client;
pub mod config;
pub mod diff;
pub mod extract;
pub mod prompt;
pub mod providers;
pub mod proxy;
pub mod relay;
pub mod request;
pub mod settings;
pub mod stats;

pub use config::AppConfig;
pub use providers::Provider;
pub use proxy::run_server;
