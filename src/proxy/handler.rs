//! Route handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::server::ProxyState;
use crate::api::{
    ApiResponse, ModelsRequest, ModelsResponse, PolishRequest, PolishResponse, RelayReply, RelayRequest,
    WritingRequest,
};
use crate::providers::{Provider, ProviderConfig};
use crate::relay::redact;
use crate::settings::GlobalProviderSetting;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// `POST /api/proxy`
pub async fn relay(State(state): State<ProxyState>, payload: Result<Json<RelayRequest>, JsonRejection>) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "Unparsable relay request");
            return reply_response(RelayReply::error(400, format!("Invalid request body: {}", rejection.body_text())));
        }
    };

    reply_response(state.relay.forward(request).await)
}

fn reply_response(reply: RelayReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    (status, Json(reply.body)).into_response()
}

/// `POST /api/proxy/ollama-models`
pub async fn ollama_models(
    State(state): State<ProxyState>,
    payload: Result<Json<ModelsRequest>, JsonRejection>,
) -> Response {
    let url = match payload {
        Ok(Json(ModelsRequest { ollama_url: Some(url) })) if !url.trim().is_empty() => url,
        Ok(_) => return with_cors(models_error(StatusCode::BAD_REQUEST, "ollamaUrl is required")),
        Err(rejection) => {
            return with_cors(models_error(
                StatusCode::BAD_REQUEST,
                &format!("Invalid request body: {}", rejection.body_text()),
            ))
        }
    };

    let response = match state.models.list(&url).await {
        Ok(models) => (StatusCode::OK, Json(ModelsResponse { models })).into_response(),
        Err(e) => {
            tracing::warn!(ollama_url = %redact(&url), error = %redact(&e.to_string()), "Model list failed");
            let status = StatusCode::from_u16(e.status()).unwrap_or(StatusCode::BAD_GATEWAY);
            models_error(status, &e.to_string())
        }
    };
    with_cors(response)
}

/// `OPTIONS /api/proxy/ollama-models`
pub async fn ollama_models_preflight() -> Response {
    with_cors(StatusCode::NO_CONTENT.into_response())
}

/// Model-list errors use a flat `{error: string}` body
fn models_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    response
}

/// `POST /api/generate`
pub async fn generate(
    State(state): State<ProxyState>,
    payload: Result<Json<WritingRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    match payload {
        Ok(Json(request)) => (StatusCode::OK, Json(state.generator.generate(&request).await)),
        Err(rejection) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failed(format!("Invalid request body: {}", rejection.body_text()))),
        ),
    }
}

/// `POST /api/polish`
pub async fn polish(
    State(state): State<ProxyState>,
    payload: Result<Json<PolishRequest>, JsonRejection>,
) -> (StatusCode, Json<PolishResponse>) {
    match payload {
        Ok(Json(request)) => (StatusCode::OK, Json(state.generator.polish(&request).await)),
        Err(rejection) => (
            StatusCode::BAD_REQUEST,
            Json(PolishResponse::failed(format!("Invalid request body: {}", rejection.body_text()))),
        ),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProviderEntry {
    id: Provider,
    requires_api_key: bool,
    #[serde(flatten)]
    config: &'static ProviderConfig,
}

/// `GET /api/providers`
pub async fn list_providers() -> Json<Vec<Value>> {
    let entries = Provider::ALL
        .iter()
        .map(|&provider| {
            serde_json::to_value(ProviderEntry {
                id: provider,
                requires_api_key: provider.requires_api_key(),
                config: provider.config(),
            })
            .unwrap_or(Value::Null)
        })
        .collect();
    Json(entries)
}

/// `GET /api/settings`, API keys masked
pub async fn get_settings(State(state): State<ProxyState>) -> Json<BTreeMap<Provider, GlobalProviderSetting>> {
    let masked = state
        .settings
        .snapshot()
        .await
        .into_iter()
        .map(|(provider, setting)| (provider, setting.masked()))
        .collect();
    Json(masked)
}

/// `PUT /api/settings/:provider`
pub async fn put_setting(
    State(state): State<ProxyState>,
    Path(provider): Path<String>,
    payload: Result<Json<GlobalProviderSetting>, JsonRejection>,
) -> Response {
    let provider: Provider = match provider.parse() {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("{}", e)),
    };
    let setting = match payload {
        Ok(Json(setting)) => setting,
        Err(rejection) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("Invalid request body: {}", rejection.body_text()),
            )
        }
    };

    let masked = setting.masked();
    match state.settings.update(provider, setting).await {
        Ok(()) => (StatusCode::OK, Json(masked)).into_response(),
        Err(e) => {
            tracing::error!(provider = %provider, error = %e, "Failed to save provider setting");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// `DELETE /api/settings/:provider`
pub async fn delete_setting(State(state): State<ProxyState>, Path(provider): Path<String>) -> Response {
    let provider: Provider = match provider.parse() {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("{}", e)),
    };

    match state.settings.remove(provider).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, &format!("No setting stored for '{}'", provider)),
        Err(e) => {
            tracing::error!(provider = %provider, error = %e, "Failed to remove provider setting");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": { "message": message } }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::proxy::build_router;
    use crate::settings::{MemorySettingsStore, SettingsHandle};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use axum::Router;
    use std::sync::Arc;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app() -> Router {
        let store = Arc::new(MemorySettingsStore::new());
        let settings = Arc::new(SettingsHandle::load(store).unwrap());
        build_router(ProxyState::new(AppConfig::default(), reqwest::Client::new(), settings))
    }

    async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value, axum::http::HeaderMap) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
        (status, value, headers)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body, _) = call(app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".to_string()));
    }

    #[tokio::test]
    async fn test_relay_missing_target_url() {
        let (status, body, _) = call(app(), Method::POST, "/api/proxy", Some(json!({"body": {}}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"].as_str().unwrap().contains("targetUrl"));
    }

    #[tokio::test]
    async fn test_relay_unparsable_body() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/proxy")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_relay_passes_upstream_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "slow down"}})))
            .mount(&server)
            .await;

        let (status, body, _) = call(
            app(),
            Method::POST,
            "/api/proxy",
            Some(json!({"targetUrl": format!("{}/v1/messages", server.uri()), "body": {"model": "c"}})),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["message"], "slow down");
    }

    #[tokio::test]
    async fn test_models_preflight() {
        let (status, _, headers) = call(app(), Method::OPTIONS, "/api/proxy/ollama-models", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
        assert!(headers.get("access-control-allow-methods").is_some());
    }

    #[tokio::test]
    async fn test_models_requires_http_url() {
        let (status, body, headers) = call(
            app(),
            Method::POST,
            "/api/proxy/ollama-models",
            Some(json!({"ollamaUrl": "localhost:11434"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");

        let (status, _, _) = call(app(), Method::POST, "/api/proxy/ollama-models", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_models_lists_from_stub() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"models": [{"name": "qwen2:7b"}]})))
            .mount(&server)
            .await;

        let (status, body, _) = call(
            app(),
            Method::POST,
            "/api/proxy/ollama-models",
            Some(json!({"ollamaUrl": server.uri()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"models": ["qwen2:7b"]}));
    }

    #[tokio::test]
    async fn test_generate_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "stub output"})))
            .mount(&server)
            .await;

        let (status, body, _) = call(
            app(),
            Method::POST,
            "/api/generate",
            Some(json!({
                "topic": "海",
                "keywords": ["浪"],
                "wordCount": 0,
                "llmApiUrl": format!("{}/api/generate", server.uri()),
                "model": "llama2",
                "apiProvider": "ollama"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "stub output");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_generate_unknown_provider_is_400() {
        let (status, body, _) = call(
            app(),
            Method::POST,
            "/api/generate",
            Some(json!({"topic": "x", "apiProvider": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["content"], "");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_providers_listing() {
        let (status, body, _) = call(app(), Method::GET, "/api/providers", None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0]["id"], "openai");
        assert_eq!(entries[0]["defaultModel"], "gpt-4o-mini");
        assert_eq!(entries[2]["requiresApiKey"], false);
    }

    #[tokio::test]
    async fn test_settings_put_get_delete() {
        let app = app();

        let (status, body, _) = call(
            app.clone(),
            Method::PUT,
            "/api/settings/anthropic",
            Some(json!({"apiKey": "sk-ant-0123456789abcd", "defaultModel": "claude-3-5-haiku"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["apiKey"], "sk-...abcd");

        let (_, body, _) = call(app.clone(), Method::GET, "/api/settings", None).await;
        assert_eq!(body["anthropic"]["defaultModel"], "claude-3-5-haiku");
        assert_eq!(body["anthropic"]["apiKey"], "sk-...abcd");

        let (status, _, _) = call(app.clone(), Method::DELETE, "/api/settings/anthropic", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) = call(app, Method::DELETE, "/api/settings/anthropic", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_settings_unknown_provider() {
        let (status, _, _) = call(app(), Method::PUT, "/api/settings/bard", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
