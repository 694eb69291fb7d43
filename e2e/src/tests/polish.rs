//! `/api/polish` - polishing prompt, extraction and diff markup

use serde_json::json;

use crate::backend::{drain_requests, queue_response};
use crate::client::post_json;
use crate::runner::TestContext;
use crate::types::MockResponse;

use super::helpers::*;

/// Without apiProvider the endpoint is treated as OpenAI-compatible and the
/// reply comes back with line diff markup
pub async fn test_polish_with_diff(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(
        &ctx.backend_state,
        MockResponse::json(chat_completion("first line\nsecond line, polished\nthird line")),
    );

    let original = "first line\nsecond line\nthird line";
    let body = polish_request(original, &ctx.backend_url("/v1/chat/completions"), "academic");
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/polish", body).await?;

    assert_status(&resp, 200)?;
    assert_eq_str(
        require_str(&resp, "polishedText")?,
        "first line\nsecond line, polished\nthird line",
        "polished text",
    )?;
    let markup = require_str(&resp, "diffMarkup")?;
    assert_true(
        markup.contains(r#"<del class="diff-delete">second line</del>"#),
        &format!("Deleted line missing from markup: {}", markup),
    )?;
    assert_true(
        markup.contains(r#"<ins class="diff-insert">second line, polished</ins>"#),
        &format!("Inserted line missing from markup: {}", markup),
    )?;
    assert_true(markup.starts_with("first line\n"), "unchanged lines stay plain")?;

    let req = single_request(drain_requests(&ctx.backend_state))?;
    assert_true(req.body.get("messages").is_some(), "custom endpoint gets the chat shape")?;
    let prompt = req.body.pointer("/messages/0/content").and_then(|v| v.as_str()).unwrap_or_default();
    assert_true(prompt.contains(original), "polish prompt should embed the original text")?;
    assert_true(req.header("authorization").is_none(), "no key configured, no Authorization header")?;
    Ok(())
}

/// HTML in either text is escaped inside the markup
pub async fn test_polish_escapes_markup(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.backend_state, MockResponse::json(chat_completion("a <b> & c")));

    let body = polish_request("a b c", &ctx.backend_url("/v1/chat/completions"), "standard");
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/polish", body).await?;

    assert_status(&resp, 200)?;
    let markup = require_str(&resp, "diffMarkup")?;
    assert_true(markup.contains("&lt;b&gt; &amp; c"), &format!("Markup not escaped: {}", markup))?;
    assert_true(!markup.contains("<b>"), "raw tag leaked into markup")?;
    Ok(())
}

/// Blank input is an error and never reaches the backend
pub async fn test_polish_empty_text(ctx: TestContext) -> anyhow::Result<()> {
    let body = polish_request("   ", &ctx.backend_url("/v1/chat/completions"), "standard");
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/polish", body).await?;

    assert_status(&resp, 200)?;
    assert_true(resp.get_str("error").is_some(), &format!("Expected an error: {}", resp.body))?;
    assert_true(resp.get("diffMarkup").is_none(), "no markup on failure")?;
    assert_true(drain_requests(&ctx.backend_state).is_empty(), "Backend should not be contacted")?;
    Ok(())
}

/// An explicit provider overrides the custom default
pub async fn test_polish_with_provider(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(
        &ctx.backend_state,
        MockResponse::json(json!({"response": "Polished by ollama", "done": true}).to_string()),
    );

    let mut body = polish_request("rough draft", &ctx.backend_url("/api/generate"), "business");
    body["apiProvider"] = json!("ollama");
    body["model"] = json!("llama3:8b");
    let resp = post_json(&ctx.http_client, &ctx.relay_addr, "/api/polish", body).await?;

    assert_status(&resp, 200)?;
    assert_eq_str(require_str(&resp, "polishedText")?, "Polished by ollama", "polished text")?;

    let req = single_request(drain_requests(&ctx.backend_state))?;
    assert_true(req.body.get("prompt").is_some(), "Ollama gets the simple-completion shape")?;
    Ok(())
}
