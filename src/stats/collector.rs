//! Metrics collected for each relayed upstream call

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// How a relayed call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayOutcome {
    /// 2xx with a JSON body
    Success,
    /// 2xx whose body was not JSON and was wrapped as `{text}`
    PlainText,
    /// Upstream answered with a non-2xx status
    UpstreamError,
    /// No response: connection, DNS, TLS or timeout failure
    TransportError,
}

impl RelayOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayOutcome::Success => "success",
            RelayOutcome::PlainText => "plain_text",
            RelayOutcome::UpstreamError => "upstream_error",
            RelayOutcome::TransportError => "transport_error",
        }
    }
}

/// Collected metrics from one relay call
#[derive(Debug, Clone, Serialize)]
pub struct RelayMetrics {
    /// Unique request ID
    pub request_id: String,
    /// When the call started
    pub timestamp: DateTime<Utc>,
    /// Host part of the target URL
    pub target_host: String,
    /// Model named in the outbound body, if any
    pub model: Option<String>,
    /// Status returned to the caller
    pub status: u16,
    pub outcome: RelayOutcome,
    pub request_bytes: usize,
    pub response_bytes: usize,
    /// Token usage reported by the upstream, when present
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub duration_ms: f64,
}

impl RelayMetrics {
    /// Start a record for a call to `target_url`
    pub fn new(target_url: &str) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            target_host: host_of(target_url),
            model: None,
            status: 0,
            outcome: RelayOutcome::TransportError,
            request_bytes: 0,
            response_bytes: 0,
            prompt_tokens: None,
            completion_tokens: None,
            duration_ms: 0.0,
        }
    }

    /// Record the outbound body's model and size
    pub fn with_request(mut self, body: &Value, bytes: usize) -> Self {
        self.model = body.get("model").and_then(|m| m.as_str()).map(str::to_string);
        self.request_bytes = bytes;
        self
    }

    /// Record token usage from whichever usage shape the upstream returned
    pub fn record_usage(&mut self, response: &Value) {
        // OpenAI-compatible
        if let Some(usage) = response.get("usage") {
            self.prompt_tokens = usage
                .get("prompt_tokens")
                .or_else(|| usage.get("input_tokens"))
                .and_then(|t| t.as_u64());
            self.completion_tokens = usage
                .get("completion_tokens")
                .or_else(|| usage.get("output_tokens"))
                .and_then(|t| t.as_u64());
            return;
        }

        // Ollama
        if response.get("eval_count").is_some() {
            self.prompt_tokens = response.get("prompt_eval_count").and_then(|t| t.as_u64());
            self.completion_tokens = response.get("eval_count").and_then(|t| t.as_u64());
            return;
        }

        // Gemini
        if let Some(usage) = response.get("usageMetadata") {
            self.prompt_tokens = usage.get("promptTokenCount").and_then(|t| t.as_u64());
            self.completion_tokens = usage.get("candidatesTokenCount").and_then(|t| t.as_u64());
        }
    }

    /// Close the record
    pub fn finish(&mut self, status: u16, outcome: RelayOutcome, response_bytes: usize, duration_ms: f64) {
        self.status = status;
        self.outcome = outcome;
        self.response_bytes = response_bytes;
        self.duration_ms = duration_ms;
    }
}

fn host_of(target_url: &str) -> String {
    url::Url::parse(target_url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{}:{}", h, port),
                None => h.to_string(),
            })
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_host_extraction() {
        assert_eq!(RelayMetrics::new("https://api.openai.com/v1/chat/completions").target_host, "api.openai.com");
        assert_eq!(RelayMetrics::new("http://localhost:11434/api/generate").target_host, "localhost:11434");
        assert_eq!(RelayMetrics::new("not a url").target_host, "unknown");
    }

    #[test]
    fn test_with_request_reads_model() {
        let m = RelayMetrics::new("http://x").with_request(&json!({"model": "llama2", "prompt": "p"}), 42);
        assert_eq!(m.model.as_deref(), Some("llama2"));
        assert_eq!(m.request_bytes, 42);

        let m = RelayMetrics::new("http://x").with_request(&json!({"contents": []}), 10);
        assert!(m.model.is_none());
    }

    #[test]
    fn test_usage_shapes() {
        let mut m = RelayMetrics::new("http://x");
        m.record_usage(&json!({"usage": {"prompt_tokens": 10, "completion_tokens": 20}}));
        assert_eq!((m.prompt_tokens, m.completion_tokens), (Some(10), Some(20)));

        let mut m = RelayMetrics::new("http://x");
        m.record_usage(&json!({"usage": {"input_tokens": 3, "output_tokens": 4}}));
        assert_eq!((m.prompt_tokens, m.completion_tokens), (Some(3), Some(4)));

        let mut m = RelayMetrics::new("http://x");
        m.record_usage(&json!({"response": "r", "prompt_eval_count": 5, "eval_count": 6}));
        assert_eq!((m.prompt_tokens, m.completion_tokens), (Some(5), Some(6)));

        let mut m = RelayMetrics::new("http://x");
        m.record_usage(&json!({"usageMetadata": {"promptTokenCount": 7, "candidatesTokenCount": 8}}));
        assert_eq!((m.prompt_tokens, m.completion_tokens), (Some(7), Some(8)));
    }

    #[test]
    fn test_finish() {
        let mut m = RelayMetrics::new("http://x");
        m.finish(200, RelayOutcome::Success, 512, 12.5);
        assert_eq!(m.status, 200);
        assert_eq!(m.outcome.as_str(), "success");
        assert_eq!(m.response_bytes, 512);
    }
}
