//! Server-side relay of a generation request to an arbitrary upstream

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_ENCODING, CONTENT_LENGTH, HOST};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Instant;

use super::decompress::{decompress_body, DecompressError};
use super::redact::{redact, redact_headers, truncate_for_log};
use crate::api::{error_message, RelayReply, RelayRequest};
use crate::config::{AppConfig, StatsFormat};
use crate::stats::{format_metrics, RelayMetrics, RelayOutcome};

/// Logging and stats behaviour of the relay
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Log request and response bodies (redacted, truncated)
    pub log_bodies: bool,
    /// Characters of each body kept in a log line
    pub body_log_limit: usize,
    pub stats_enabled: bool,
    pub stats_format: StatsFormat,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            log_bodies: true,
            body_log_limit: 2000,
            stats_enabled: false,
            stats_format: StatsFormat::default(),
        }
    }
}

impl RelayOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            log_bodies: config.relay.log_bodies,
            body_log_limit: config.relay.body_log_limit,
            stats_enabled: config.stats.enabled,
            stats_format: config.stats.format,
        }
    }
}

/// A connection-level failure, reported with its full error chain
#[derive(Debug, Clone, PartialEq)]
pub struct TransportFailure {
    pub message: String,
    pub stack: String,
    pub cause: Option<String>,
}

impl TransportFailure {
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            causes.push(inner.to_string());
            source = inner.source();
        }

        Self {
            message: err.to_string(),
            stack: format!("{:?}", err),
            cause: if causes.is_empty() { None } else { Some(causes.join(": ")) },
        }
    }

    pub fn to_body(&self) -> Value {
        json!({
            "error": {
                "message": self.message,
                "stack": self.stack,
                "cause": self.cause,
            }
        })
    }
}

/// Reasons a relay call produces no upstream answer
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("targetUrl is required")]
    MissingTargetUrl,

    #[error("Invalid targetUrl '{url}': {reason}")]
    InvalidTargetUrl { url: String, reason: String },

    #[error("Invalid header '{0}'")]
    InvalidHeader(String),

    #[error("Request body is required")]
    MissingBody,

    #[error("{}", .0.message)]
    Transport(TransportFailure),

    #[error("Failed to decode upstream response: {0}")]
    Decompress(#[from] DecompressError),
}

impl RelayError {
    pub fn status(&self) -> u16 {
        match self {
            RelayError::MissingTargetUrl
            | RelayError::InvalidTargetUrl { .. }
            | RelayError::InvalidHeader(_)
            | RelayError::MissingBody => 400,
            RelayError::Transport(_) | RelayError::Decompress(_) => 502,
        }
    }

    pub fn into_reply(self) -> RelayReply {
        match self {
            RelayError::Transport(failure) => RelayReply::new(502, failure.to_body()),
            other => RelayReply::error(other.status(), other.to_string()),
        }
    }
}

/// A validated relay call
struct Outbound {
    url: url::Url,
    headers: HeaderMap,
    body: Value,
}

/// Forwards relay requests through a shared HTTP client
pub struct RelayService {
    client: reqwest::Client,
    options: RelayOptions,
}

impl RelayService {
    pub fn new(client: reqwest::Client, options: RelayOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Relay one request. Never fails: every outcome is a status plus JSON body.
    pub async fn forward(&self, request: RelayRequest) -> RelayReply {
        let start = Instant::now();

        let outbound = match validate(request) {
            Ok(outbound) => outbound,
            Err(e) => {
                tracing::warn!(error = %redact(&e.to_string()), "Rejected relay request");
                return e.into_reply();
            }
        };

        let request_bytes = serde_json::to_vec(&outbound.body).map(|b| b.len()).unwrap_or(0);
        let mut metrics = RelayMetrics::new(outbound.url.as_str()).with_request(&outbound.body, request_bytes);

        self.log_outbound(&outbound);

        let (reply, outcome, response_bytes) = match self.send(outbound).await {
            Ok((reply, outcome, bytes)) => (reply, outcome, bytes),
            Err(e) => {
                tracing::error!(error = %redact(&e.to_string()), "Relay call failed");
                (e.into_reply(), RelayOutcome::TransportError, 0)
            }
        };

        if reply.is_success() {
            metrics.record_usage(&reply.body);
        }
        metrics.finish(reply.status, outcome, response_bytes, start.elapsed().as_secs_f64() * 1000.0);
        self.log_metrics(&metrics);

        reply
    }

    async fn send(&self, outbound: Outbound) -> Result<(RelayReply, RelayOutcome, usize), RelayError> {
        let response = self
            .client
            .post(outbound.url)
            .headers(outbound.headers)
            .json(&outbound.body)
            .send()
            .await
            .map_err(|e| RelayError::Transport(TransportFailure::from_error(&e)))?;

        let status = response.status();
        let content_encoding = response
            .headers()
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let raw = response
            .bytes()
            .await
            .map_err(|e| RelayError::Transport(TransportFailure::from_error(&e)))?;
        let bytes = decompress_body(&raw, content_encoding.as_deref())?;
        let text = String::from_utf8_lossy(&bytes);

        if self.options.log_bodies {
            tracing::debug!(
                status = %status,
                body = %truncate_for_log(&redact(&text), self.options.body_log_limit),
                "Upstream response"
            );
        }

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| error_message(&v))
                .or_else(|| {
                    let trimmed = text.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                })
                .unwrap_or_else(|| format!("Upstream returned {}", status));

            tracing::warn!(status = %status, message = %redact(&message), "Upstream returned error status");
            return Ok((
                RelayReply::error(status.as_u16(), message),
                RelayOutcome::UpstreamError,
                bytes.len(),
            ));
        }

        let (reply, outcome) = match serde_json::from_str::<Value>(&text) {
            Ok(body) => (RelayReply::new(status.as_u16(), body), RelayOutcome::Success),
            Err(e) => {
                tracing::debug!(error = %e, "Upstream body is not JSON, wrapping as text");
                (
                    RelayReply::new(status.as_u16(), json!({ "text": text })),
                    RelayOutcome::PlainText,
                )
            }
        };

        Ok((reply, outcome, bytes.len()))
    }

    fn log_outbound(&self, outbound: &Outbound) {
        let headers: BTreeMap<String, String> = outbound
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("[binary]").to_string()))
            .collect();

        tracing::info!(
            target_url = %redact(outbound.url.as_str()),
            headers = %redact_headers(&headers),
            "Relaying request"
        );

        if self.options.log_bodies {
            tracing::debug!(
                body = %truncate_for_log(&redact(&outbound.body.to_string()), self.options.body_log_limit),
                "Relay request body"
            );
        }
    }

    fn log_metrics(&self, metrics: &RelayMetrics) {
        if !self.options.stats_enabled {
            return;
        }
        let formatted = format_metrics(metrics, self.options.stats_format);
        if self.options.stats_format == StatsFormat::Pretty {
            tracing::info!("\n{}", formatted);
        } else {
            tracing::info!("{}", formatted);
        }
    }
}

fn validate(request: RelayRequest) -> Result<Outbound, RelayError> {
    let target = request
        .target_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(RelayError::MissingTargetUrl)?;

    let url = url::Url::parse(target).map_err(|e| RelayError::InvalidTargetUrl {
        url: target.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(RelayError::InvalidTargetUrl {
            url: target.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if request.body.is_null() {
        return Err(RelayError::MissingBody);
    }

    let mut headers = HeaderMap::new();
    for (name, value) in request.headers.unwrap_or_default() {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| RelayError::InvalidHeader(name.clone()))?;
        // reqwest sets these from the URL and body
        if header_name == HOST || header_name == CONTENT_LENGTH {
            continue;
        }
        let header_value = HeaderValue::from_str(&value).map_err(|_| RelayError::InvalidHeader(name.clone()))?;
        headers.insert(header_name, header_value);
    }

    Ok(Outbound {
        url,
        headers,
        body: request.body,
    })
}
