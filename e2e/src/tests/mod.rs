//! Test registry - all test cases are registered here

pub mod helpers;
pub mod polish;
pub mod relay;

use crate::runner::TestCase;

/// Build and return all test cases
///
/// Tests are grouped by category. Each test:
/// 1. Queues a mock backend response (what the provider would return)
/// 2. Sends a request to the REAL relay, pointed at the mock backend
/// 3. Validates the relay response and what the backend received
pub fn all_tests() -> Vec<TestCase> {
    macro_rules! test {
        ($name:expr, $desc:expr, $func:path) => {
            TestCase {
                name: $name,
                description: $desc,
                run: Box::new(|ctx| Box::pin($func(ctx))),
            }
        };
    }

    vec![
        // ── Relay ─────────────────────────────────────────────────────────────
        test!("relay/health", "/health answers OK locally", relay::test_health),
        test!(
            "relay/json_passthrough",
            "Upstream JSON and forwarded headers pass through unchanged",
            relay::test_json_passthrough
        ),
        test!(
            "relay/plain_text_wrapped",
            "Non-JSON upstream bodies come back as {text}",
            relay::test_plain_text_wrapped
        ),
        test!(
            "relay/upstream_error_status",
            "Upstream error status is kept and error.message filled",
            relay::test_upstream_error_status
        ),
        test!(
            "relay/unreachable_target",
            "Connection failures map to 502 with message and stack",
            relay::test_unreachable_target
        ),
        test!(
            "relay/invalid_target",
            "Missing, non-http and malformed envelopes are rejected with 400",
            relay::test_invalid_target_rejected
        ),
        test!("relay/get_not_allowed", "GET /api/proxy is 405", relay::test_get_not_allowed),

        // ── Generation ────────────────────────────────────────────────────────
        test!(
            "generate/ollama",
            "Ollama gets the simple-completion shape without auth",
            generate::test_ollama_generate
        ),
        test!(
            "generate/openai",
            "OpenAI gets chat messages and a bearer token",
            generate::test_openai_generate
        ),
        test!(
            "generate/anthropic",
            "Anthropic gets x-api-key, version header and max_tokens",
            generate::test_anthropic_generate
        ),
        test!(
            "generate/google",
            "Gemini model is substituted into the URL",
            generate::test_google_generate
        ),
        test!(
            "generate/missing_api_key",
            "Key-requiring providers fail before any network call",
            generate::test_missing_api_key
        ),
        test!(
            "generate/upstream_error",
            "Upstream error message and status reach the caller",
            generate::test_upstream_error
        ),
        test!(
            "generate/unrecognized_shape",
            "Unknown response shapes produce diagnostic text",
            generate::test_unrecognized_shape_diagnostic
        ),
        test!(
            "generate/malformed_body",
            "Unparseable generate bodies are rejected with 400",
            generate::test_malformed_body
        ),

        // ── Polish ────────────────────────────────────────────────────────────
        test!(
            "polish/diff_markup",
            "Polished text comes back with line diff markup",
            polish::test_polish_with_diff
        ),
        test!(
            "polish/escapes_markup",
            "HTML in polished text is escaped in the markup",
            polish::test_polish_escapes_markup
        ),
        test!(
            "polish/empty_text",
            "Blank input is rejected without a network call",
            polish::test_polish_empty_text
        ),
        test!(
            "polish/explicit_provider",
            "apiProvider overrides the OpenAI-compatible default",
            polish::test_polish_with_provider
        ),

        // ── Model discovery ───────────────────────────────────────────────────
        test!("models/list", "Tag list is reduced to model names", models::test_list_models),
        test!(
            "models/from_generate_url",
            "A generate URL still resolves to /api/tags",
            models::test_list_models_from_generate_url
        ),
        test!(
            "models/alternate_shape",
            "Alternate list shapes are normalized",
            models::test_list_models_alternate_shape
        ),
        test!(
            "models/missing_url",
            "Missing ollamaUrl is a 400 with CORS headers",
            models::test_missing_ollama_url
        ),
        test!(
            "models/upstream_failure",
            "Tag list failure status is passed through",
            models::test_upstream_failure
        ),
        test!("models/preflight", "OPTIONS answers 204 with CORS headers", models::test_preflight),

        // ── Settings ──────────────────────────────────────────────────────────
        test!(
            "settings/lifecycle",
            "Stored settings drive generation until deleted",
            settings::test_settings_lifecycle
        ),
        test!(
            "settings/unknown_provider",
            "Unknown provider names are rejected",
            settings::test_unknown_provider
        ),
        test!(
            "settings/list_providers",
            "Provider registry lists all seven providers",
            settings::test_list_providers
        ),
    ]
}
