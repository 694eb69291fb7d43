//! `/api/proxy` relay behavior - passthrough, text wrapping, error envelopes

use reqwest::Method;
use serde_json::json;

use crate::backend::{drain_requests, queue_response};
use crate::client::{post_json, post_raw, send_empty};
use crate::runner::TestContext;
use crate::types::MockResponse;

use super::helpers::*;

/// JSON body goes upstream untouched and the upstream JSON comes back as-is
pub async fn test_json_passthrough(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.backend_state, MockResponse::json(chat_completion("Hello, world!")));

    let upstream_body = json!({
        "model": "test-model",
        "messages": [{"role": "user", "content": "say hello"}],
        "temperature": 0.7,
        "stream": false
    });
    let envelope = relay_envelope(
        &ctx.backend_url("/v1/chat/completions"),
        json!({"Content-Type": "application/json", "Authorization": "Bearer sk-e2e-secret"}),
        upstream_body.clone(),
    );

    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/proxy", envelope).await?;

    assert_status(&resp, 200)?;
    assert_eq_str(require_str(&resp, "choices.0.message.content")?, "Hello, world!", "relayed content")?;
    assert_true(resp.get("usage.total_tokens") == Some(&json!(15)), "usage block should pass through")?;

    let req = single_request(drain_requests(&ctx.backend_state))?;
    assert_eq_str(&req.path, "/v1/chat/completions", "upstream path")?;
    assert_true(req.body == upstream_body, &format!("Upstream body changed in transit: {}", req.body))?;
    assert_eq_str(
        req.header("authorization").unwrap_or_default(),
        "Bearer sk-e2e-secret",
        "forwarded Authorization header",
    )?;

    Ok(())
}

/// Non-JSON upstream bodies are wrapped as `{text}`
pub async fn test_plain_text_wrapped(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.backend_state, MockResponse::text("just some words"));

    let envelope = relay_envelope(&ctx.backend_url("/api/generate"), json!({}), json!({"model": "m", "prompt": "p"}));
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/proxy", envelope).await?;

    assert_status(&resp, 200)?;
    assert_true(
        resp.body == json!({"text": "just some words"}),
        &format!("Expected text wrapper, got {}", resp.body),
    )?;
    Ok(())
}

/// Upstream 4xx/5xx keep their status and carry `error.message`
pub async fn test_upstream_error_status(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.backend_state, MockResponse::error(429, error_body("Rate limit exceeded")));

    let envelope = relay_envelope(&ctx.backend_url("/v1/chat/completions"), json!({}), json!({"model": "m"}));
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/proxy", envelope).await?;

    assert_status(&resp, 429)?;
    assert_eq_str(require_str(&resp, "error.message")?, "Rate limit exceeded", "upstream error message")?;
    Ok(())
}

/// Connection failures become 502 with message, stack and cause
pub async fn test_unreachable_target(ctx: TestContext) -> anyhow::Result<()> {
    // Port 9 (discard) is not listening on a test machine
    let envelope = relay_envelope("http://127.0.0.1:9/api/generate", json!({}), json!({"model": "m"}));
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/proxy", envelope).await?;

    assert_status(&resp, 502)?;
    assert_true(
        !require_str(&resp, "error.message")?.is_empty(),
        "502 envelope should carry a message",
    )?;
    assert_true(resp.get("error.stack").is_some(), "502 envelope should carry a stack")?;
    assert_true(drain_requests(&ctx.backend_state).is_empty(), "Backend should not be contacted")?;
    Ok(())
}

/// Missing or non-http target URLs are rejected with 400 before any network call
pub async fn test_invalid_target_rejected(ctx: TestContext) -> anyhow::Result<()> {
    let missing = json!({"body": {"model": "m"}});
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/proxy", missing).await?;
    assert_status(&resp, 400)?;

    let ftp = relay_envelope("ftp://127.0.0.1/x", json!({}), json!({"model": "m"}));
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/proxy", ftp).await?;
    assert_status(&resp, 400)?;

    let resp = post_raw(&ctx.http_client, &ctx.relay_addr, "/api/proxy", "{not json").await?;
    assert_status(&resp, 400)?;

    assert_true(drain_requests(&ctx.backend_state).is_empty(), "Backend should not be contacted")?;
    Ok(())
}

/// GET on the relay route is not allowed
pub async fn test_get_not_allowed(ctx: TestContext) -> anyhow::Result<()> {
    let resp = send_empty(&ctx.http_client, Method::GET, &ctx.relay_addr, "/api/proxy").await?;
    assert_status(&resp, 405)
}

/// `/health` answers without touching the backend
pub async fn test_health(ctx: TestContext) -> anyhow::Result<()> {
    let resp = send_empty(&ctx.http_client, Method::GET, &ctx.relay_addr, "/health").await?;
    assert_status(&resp, 200)?;
    assert_true(resp.body == json!("OK"), &format!("Unexpected health body: {}", resp.body))?;
    assert_true(drain_requests(&ctx.backend_state).is_empty(), "Health should not reach the backend")?;
    Ok(())
}
