//! HTTP client that talks to the relay the way the browser UI does

use reqwest::{Client, Method};
use std::collections::BTreeMap;

use crate::types::RelayResponse;

/// Build an HTTP client
pub fn build_client() -> Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to build reqwest client")
}

/// POST a JSON body to a relay route
pub async fn post_json(
    client: &Client,
    relay_addr: &str,
    path: &str,
    body: serde_json::Value,
) -> anyhow::Result<RelayResponse> {
    send(client, Method::POST, relay_addr, path, Some(body)).await
}

/// PUT a JSON body to a relay route
pub async fn put_json(
    client: &Client,
    relay_addr: &str,
    path: &str,
    body: serde_json::Value,
) -> anyhow::Result<RelayResponse> {
    send(client, Method::PUT, relay_addr, path, Some(body)).await
}

/// Send a request without a body (GET, DELETE, OPTIONS)
pub async fn send_empty(client: &Client, method: Method, relay_addr: &str, path: &str) -> anyhow::Result<RelayResponse> {
    send(client, method, relay_addr, path, None).await
}

/// Send raw bytes as a JSON POST (for malformed-body tests)
pub async fn post_raw(client: &Client, relay_addr: &str, path: &str, body: &'static str) -> anyhow::Result<RelayResponse> {
    let url = format!("http://{relay_addr}{path}");
    let resp = client
        .post(&url)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to POST {}: {}", url, e))?;
    read_response(resp).await
}

async fn send(
    client: &Client,
    method: Method,
    relay_addr: &str,
    path: &str,
    body: Option<serde_json::Value>,
) -> anyhow::Result<RelayResponse> {
    let url = format!("http://{relay_addr}{path}");

    let mut builder = client.request(method.clone(), &url);
    if let Some(body) = body {
        builder = builder.json(&body);
    }

    let resp = builder
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to {} {}: {}", method, url, e))?;

    read_response(resp).await
}

/// Non-JSON bodies come back as a JSON string; empty bodies as null
async fn read_response(resp: reqwest::Response) -> anyhow::Result<RelayResponse> {
    let status = resp.status().as_u16();
    let headers: BTreeMap<String, String> = resp
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_lowercase(), v.to_str().ok()?.to_string())))
        .collect();

    let body_text = resp
        .text()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read relay response: {}", e))?;

    let body = if body_text.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&body_text).unwrap_or(serde_json::Value::String(body_text))
    };

    Ok(RelayResponse { status, headers, body })
}
