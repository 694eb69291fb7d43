//! How a built request reaches the relay

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::GenerationError;
use crate::api::{RelayReply, RelayRequest};
use crate::relay::RelayService;

/// Delivers relay requests; in-process or to a running proxy
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, request: RelayRequest) -> Result<RelayReply, GenerationError>;

    /// Name of the transport (for logging)
    fn name(&self) -> &str;
}

/// Calls the relay directly, without an HTTP hop
pub struct InProcessTransport {
    relay: Arc<RelayService>,
}

impl InProcessTransport {
    pub fn new(relay: Arc<RelayService>) -> Self {
        Self { relay }
    }
}

#[async_trait]
impl RelayTransport for InProcessTransport {
    async fn send(&self, request: RelayRequest) -> Result<RelayReply, GenerationError> {
        Ok(self.relay.forward(request).await)
    }

    fn name(&self) -> &str {
        "in-process"
    }
}

/// POSTs to the `/api/proxy` endpoint of a running server
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// `proxy_base` is the server root, e.g. `http://127.0.0.1:3000`
    pub fn new(client: reqwest::Client, proxy_base: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/proxy", proxy_base.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RelayTransport for HttpTransport {
    async fn send(&self, request: RelayRequest) -> Result<RelayReply, GenerationError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("Failed to reach proxy {}: {}", self.endpoint, e)))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(format!("Failed to read proxy response: {}", e)))?;

        let body = serde_json::from_str::<Value>(&text).map_err(|_| GenerationError::Transport(format!(
            "Proxy returned a non-JSON body (status {})",
            status
        )))?;

        Ok(RelayReply::new(status, body))
    }

    fn name(&self) -> &str {
        "http"
    }
}
