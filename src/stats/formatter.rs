//! Stats formatting for different output formats

use super::RelayMetrics;
use crate::config::StatsFormat;

/// Format metrics according to the configured format
pub fn format_metrics(metrics: &RelayMetrics, format: StatsFormat) -> String {
    match format {
        StatsFormat::Pretty => format_pretty(metrics),
        StatsFormat::Json => format_json(metrics),
        StatsFormat::Compact => format_compact(metrics),
    }
}

/// Pretty box format for terminal output
fn format_pretty(m: &RelayMetrics) -> String {
    let tokens_str = match (m.prompt_tokens, m.completion_tokens) {
        (Some(p), Some(c)) => format!("{} in / {} out", p, c),
        (Some(p), None) => format!("{} in", p),
        (None, Some(c)) => format!("{} out", c),
        (None, None) => "N/A".to_string(),
    };

    format!(
        r#"┌──────────────────────────────────────────────────────────────────┐
│ Relay Call                                                       │
├──────────────────────────────────────────────────────────────────┤
│ Target: {:56}│
│ Model:  {:56}│
│ Time:   {:56}│
├──────────────────────────────────────────────────────────────────┤
│ Status: {:<5} Outcome: {:41}│
│ Bytes:  {:>8} sent │ {:>8} received                          │
│ Tokens: {:56}│
│ Duration: {:54.1}│
└──────────────────────────────────────────────────────────────────┘
"#,
        truncate(&m.target_host, 56),
        truncate(m.model.as_deref().unwrap_or("-"), 56),
        m.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        m.status,
        m.outcome.as_str(),
        m.request_bytes,
        m.response_bytes,
        truncate(&tokens_str, 56),
        m.duration_ms,
    )
}

/// JSON format for structured logging
fn format_json(m: &RelayMetrics) -> String {
    serde_json::to_string(m).unwrap_or_else(|_| "{}".to_string())
}

/// Compact single-line format
fn format_compact(m: &RelayMetrics) -> String {
    format!(
        "[{}] host={} model={} status={} outcome={} bytes={}/{} dur={:.1}ms",
        m.timestamp.format("%H:%M:%S"),
        m.target_host,
        m.model.as_deref().unwrap_or("-"),
        m.status,
        m.outcome.as_str(),
        m.request_bytes,
        m.response_bytes,
        m.duration_ms
    )
}

/// Truncate to `max_chars` characters with ellipsis
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
