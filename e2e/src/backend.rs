//! Mock provider backend
//!
//! Speaks just enough of each provider's wire shape for the relay to talk
//! to it: OpenAI-style chat completions, Anthropic messages, Gemini
//! generateContent, Ollama generate and the Ollama tag list. Tests queue
//! responses via SharedBackendState before each request; with nothing
//! queued every route answers in its own provider's default shape.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::types::{BackendState, MockResponse, ReceivedRequest, SharedBackendState};

/// Default model list returned by /api/tags
fn default_tags_response() -> &'static str {
    r#"{"models":[{"name":"llama3:8b","size":4661224676},{"name":"qwen2:7b","size":4431400262}]}"#
}

/// Default answer for a generation request, in the shape the path implies
fn default_generation_response(path: &str) -> MockResponse {
    let body = if path.starts_with("/api/generate") {
        r#"{"model":"llama3","response":"Default ollama response","done":true,"eval_count":7}"#
    } else if path.starts_with("/v1/messages") {
        r#"{"id":"msg_default","type":"message","role":"assistant","content":[{"type":"text","text":"Default anthropic response"}],"usage":{"input_tokens":10,"output_tokens":4}}"#
    } else if path.starts_with("/v1beta/models/") {
        r#"{"candidates":[{"content":{"parts":[{"text":"Default gemini response"}],"role":"model"}}],"usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":4}}"#
    } else {
        r#"{"id":"chatcmpl-default","object":"chat.completion","created":1700000000,"model":"test-model","choices":[{"index":0,"message":{"role":"assistant","content":"Default response (no mock queued)"},"finish_reason":"stop"}],"usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#
    };
    MockResponse::json(body)
}

/// Record a request and pop the next queued response
fn record(state: &SharedBackendState, received: ReceivedRequest) -> Option<MockResponse> {
    let mut state = state.lock().unwrap();
    state.received_requests.push(received);
    state.response_queue.pop_front()
}

async fn capture(request: Request<Body>) -> ReceivedRequest {
    let path = request.uri().path().to_string();
    let headers: BTreeMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_lowercase(), v.to_str().ok()?.to_string())))
        .collect();

    let body_bytes = axum::body::to_bytes(request.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap_or_default();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);

    ReceivedRequest { path, headers, body }
}

fn respond(mock: MockResponse) -> Response {
    Response::builder()
        .status(mock.status)
        .header("Content-Type", &mock.content_type)
        .body(Body::from(mock.body))
        .unwrap()
        .into_response()
}

/// Handle every generation route - serves pre-configured mock responses
async fn handle_generation(State(state): State<SharedBackendState>, request: Request<Body>) -> Response {
    let received = capture(request).await;
    let path = received.path.clone();
    let mock = record(&state, received).unwrap_or_else(|| default_generation_response(&path));
    respond(mock)
}

/// Handle GET /api/tags
async fn handle_tags(State(state): State<SharedBackendState>, request: Request<Body>) -> Response {
    let received = capture(request).await;
    let mock = record(&state, received).unwrap_or_else(|| MockResponse::json(default_tags_response()));
    respond(mock)
}

/// Handle GET /health
async fn handle_health() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// Start the mock backend server and return the shared state handle
pub async fn start(port: u16) -> anyhow::Result<SharedBackendState> {
    let state: SharedBackendState = std::sync::Arc::new(std::sync::Mutex::new(BackendState::default()));

    let app = Router::new()
        .route("/v1/chat/completions", post(handle_generation))
        .route("/v1/messages", post(handle_generation))
        .route("/v1beta/models/:model_action", post(handle_generation))
        .route("/api/generate", post(handle_generation))
        .route("/api/tags", get(handle_tags))
        .route("/health", get(handle_health))
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind mock backend to {}: {}", addr, e))?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock backend server failed");
    });

    // Brief pause to let the server start accepting connections
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    Ok(state)
}

/// Configure the next response for any backend route
pub fn queue_response(state: &SharedBackendState, response: MockResponse) {
    state.lock().unwrap().response_queue.push_back(response);
}

/// All requests received since the last drain
pub fn drain_requests(state: &SharedBackendState) -> Vec<ReceivedRequest> {
    let mut s = state.lock().unwrap();
    s.received_requests.drain(..).collect()
}
