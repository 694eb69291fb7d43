//! Model enumeration for locally hosted Ollama servers

use serde_json::Value;
use std::time::Duration;

use super::redact::redact;
use crate::api::error_message;

/// Upper bound on a model-list fetch
pub const MODEL_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Path suffixes a configured Ollama URL commonly carries
const KNOWN_SUFFIXES: [&str; 4] = ["/api/generate", "/api/chat", "/api/tags", "/api"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelListError {
    #[error("ollamaUrl must start with http: '{0}'")]
    InvalidUrl(String),

    #[error("Timed out after {0:?} fetching models")]
    Timeout(Duration),

    #[error("Failed to reach Ollama: {0}")]
    Transport(String),

    #[error("Ollama returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid model list response: {0}")]
    Decode(String),
}

impl ModelListError {
    pub fn status(&self) -> u16 {
        match self {
            ModelListError::InvalidUrl(_) => 400,
            ModelListError::Timeout(_) => 504,
            ModelListError::Transport(_) | ModelListError::Decode(_) => 502,
            ModelListError::Upstream { status, .. } => *status,
        }
    }
}

/// Lists models through a shared HTTP client with an abort-on-timeout bound
pub struct ModelLister {
    client: reqwest::Client,
    timeout: Duration,
}

impl ModelLister {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// GET `{ollama_url}/api/tags` and flatten the reply into model names
    pub async fn list(&self, ollama_url: &str) -> Result<Vec<String>, ModelListError> {
        let ollama_url = ollama_url.trim();
        if !ollama_url.starts_with("http") {
            return Err(ModelListError::InvalidUrl(ollama_url.to_string()));
        }

        let url = tags_url(ollama_url);
        tracing::debug!(url = %redact(&url), timeout = ?self.timeout, "Fetching model list");

        let fetch = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| ModelListError::Transport(e.to_string()))?;
            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| ModelListError::Transport(e.to_string()))?;
            Ok::<_, ModelListError>((status, text))
        };

        let (status, text) = tokio::time::timeout(self.timeout, fetch)
            .await
            .map_err(|_| {
                tracing::warn!(url = %redact(&url), "Model list request timed out");
                ModelListError::Timeout(self.timeout)
            })??;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or_else(|| text.trim().to_string());
            return Err(ModelListError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = serde_json::from_str(&text).map_err(|e| ModelListError::Decode(e.to_string()))?;
        let models = normalize_model_list(&body);
        tracing::info!(url = %redact(&url), count = models.len(), "Fetched model list");
        Ok(models)
    }
}

/// Turn a configured Ollama URL (base or endpoint) into its tags endpoint
pub fn tags_url(ollama_url: &str) -> String {
    let mut base = ollama_url.trim().trim_end_matches('/');
    for suffix in KNOWN_SUFFIXES {
        if let Some(stripped) = base.strip_suffix(suffix) {
            base = stripped;
            break;
        }
    }
    format!("{}/api/tags", base.trim_end_matches('/'))
}

/// Flatten the upstream reply into model names.
///
/// Accepts `{models:[{name}]}`, `{models:["a"]}`, `{names:[..]}`, a bare
/// array, or as a last resort the first array-valued field that yields names.
pub fn normalize_model_list(body: &Value) -> Vec<String> {
    if let Some(items) = body.as_array() {
        return names_from(items);
    }

    for key in ["models", "names"] {
        if let Some(items) = body.get(key).and_then(|v| v.as_array()) {
            return names_from(items);
        }
    }

    body.as_object()
        .into_iter()
        .flat_map(|obj| obj.values())
        .filter_map(|v| v.as_array())
        .map(|items| names_from(items))
        .find(|names| !names.is_empty())
        .unwrap_or_default()
}

fn names_from(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => ["name", "model", "id"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(|v| v.as_str())),
            _ => None,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tags_url() {
        assert_eq!(tags_url("http://localhost:11434"), "http://localhost:11434/api/tags");
        assert_eq!(tags_url("http://localhost:11434/"), "http://localhost:11434/api/tags");
        assert_eq!(tags_url("http://localhost:11434/api/generate"), "http://localhost:11434/api/tags");
        assert_eq!(tags_url("http://gpu:11434/api/chat/"), "http://gpu:11434/api/tags");
        assert_eq!(tags_url("http://gpu:11434/api/tags"), "http://gpu:11434/api/tags");
    }

    #[test]
    fn test_normalize_object_models() {
        let body = json!({"models": [{"name": "llama2:latest", "size": 1}, {"name": "qwen2:7b"}]});
        assert_eq!(normalize_model_list(&body), vec!["llama2:latest", "qwen2:7b"]);
    }

    #[test]
    fn test_normalize_string_models() {
        assert_eq!(normalize_model_list(&json!({"models": ["a", "b"]})), vec!["a", "b"]);
    }

    #[test]
    fn test_normalize_names() {
        assert_eq!(normalize_model_list(&json!({"names": ["x"]})), vec!["x"]);
    }

    #[test]
    fn test_normalize_heuristic_scan() {
        let body = json!({"count": 2, "empty": [], "data": [{"id": "m1"}, {"id": "m2"}]});
        assert_eq!(normalize_model_list(&body), vec!["m1", "m2"]);
    }

    #[test]
    fn test_normalize_nothing() {
        assert!(normalize_model_list(&json!({"status": "ok"})).is_empty());
        assert!(normalize_model_list(&json!("text")).is_empty());
    }

    #[tokio::test]
    async fn test_list_against_stub() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": [{"name": "llama2"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let lister = ModelLister::new(reqwest::Client::new(), MODEL_LIST_TIMEOUT);
        let models = lister.list(&format!("{}/api/generate", server.uri())).await.unwrap();
        assert_eq!(models, vec!["llama2"]);
    }

    #[tokio::test]
    async fn test_list_rejects_non_http() {
        let lister = ModelLister::new(reqwest::Client::new(), MODEL_LIST_TIMEOUT);
        let err = lister.list("localhost:11434").await.unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[tokio::test]
    async fn test_list_timeout_is_504() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"models": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let lister = ModelLister::new(reqwest::Client::new(), Duration::from_millis(50));
        let err = lister.list(&server.uri()).await.unwrap_err();
        assert!(matches!(err, ModelListError::Timeout(_)));
        assert_eq!(err.status(), 504);
    }

    #[tokio::test]
    async fn test_list_upstream_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let lister = ModelLister::new(reqwest::Client::new(), MODEL_LIST_TIMEOUT);
        let err = lister.list(&server.uri()).await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_list_connection_refused_is_502() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let lister = ModelLister::new(reqwest::Client::new(), MODEL_LIST_TIMEOUT);
        let err = lister.list(&format!("http://127.0.0.1:{}", port)).await.unwrap_err();
        assert_eq!(err.status(), 502);
    }
}
