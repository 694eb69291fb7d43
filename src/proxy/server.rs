//! HTTP server wiring

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handler;
use crate::client::{GenerationClient, InProcessTransport};
use crate::config::AppConfig;
use crate::relay::{ModelLister, RelayOptions, RelayService};
use crate::settings::SettingsHandle;

/// Shared state for the server
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<AppConfig>,
    pub relay: Arc<RelayService>,
    pub models: Arc<ModelLister>,
    pub settings: Arc<SettingsHandle>,
    pub generator: Arc<GenerationClient>,
}

impl ProxyState {
    /// Assemble state around an existing HTTP client
    pub fn new(config: AppConfig, http_client: reqwest::Client, settings: Arc<SettingsHandle>) -> Self {
        let relay = Arc::new(RelayService::new(http_client.clone(), RelayOptions::from_config(&config)));
        let models = Arc::new(ModelLister::new(
            http_client,
            Duration::from_secs(config.ollama.timeout_seconds),
        ));
        let generator = Arc::new(GenerationClient::new(
            Arc::new(InProcessTransport::new(relay.clone())),
            settings.clone(),
        ));

        Self {
            config: Arc::new(config),
            relay,
            models,
            settings,
            generator,
        }
    }
}

/// Build an HTTP client with TLS configuration
pub fn build_http_client(config: &AppConfig) -> Result<reqwest::Client, Box<dyn std::error::Error>> {
    let mut client_builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.relay.timeout_seconds))
        .pool_max_idle_per_host(10);

    if let Some(ref tls) = config.relay.tls {
        if tls.accept_invalid_certs {
            client_builder = client_builder.danger_accept_invalid_certs(true);
            tracing::warn!("TLS: Accepting invalid certificates (use only for development/testing)");
        }

        if let Some(ref ca_path) = tls.ca_cert_path {
            let ca_cert = std::fs::read(ca_path)?;
            let ca_cert = reqwest::Certificate::from_pem(&ca_cert)?;
            client_builder = client_builder.add_root_certificate(ca_cert);
            tracing::info!("TLS: Loaded custom CA certificate from {}", ca_path);
        }
    }

    Ok(client_builder.build()?)
}

/// All routes, with body limit, tracing and optional CORS layers
pub fn build_router(state: ProxyState) -> Router {
    let body_limit = state.config.relay.max_body_bytes;
    let cors_permissive = state.config.server.cors_permissive;

    let router = Router::new()
        .route("/health", get(handler::health))
        .route("/api/proxy", post(handler::relay))
        .route(
            "/api/proxy/ollama-models",
            post(handler::ollama_models).options(handler::ollama_models_preflight),
        )
        .route("/api/generate", post(handler::generate))
        .route("/api/polish", post(handler::polish))
        .route("/api/providers", get(handler::list_providers))
        .route("/api/settings", get(handler::get_settings))
        .route(
            "/api/settings/:provider",
            put(handler::put_setting).delete(handler::delete_setting),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http());

    let router = if cors_permissive {
        router.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
    } else {
        router
    };

    router.with_state(state)
}

/// Run the server
pub async fn run_server(config: AppConfig, settings: Arc<SettingsHandle>) -> Result<(), Box<dyn std::error::Error>> {
    let http_client = build_http_client(&config)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = ProxyState::new(config.clone(), http_client, settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("scribe-relay listening on {}", addr);
    tracing::info!(
        relay_timeout_seconds = config.relay.timeout_seconds,
        model_list_timeout_seconds = config.ollama.timeout_seconds,
        cors_permissive = config.server.cors_permissive,
        "Relay ready"
    );

    Ok(axum::serve(listener, app).await?)
}
