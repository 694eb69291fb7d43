//! Line-level diff rendered as HTML insert/delete markup
//!
//! A single forward pass with one line of lookahead. This is a greedy
//! heuristic, not a minimal edit script: repeated or shifted blocks can be
//! reported as delete+insert pairs where a Myers diff would align them.

/// Opening/closing markers for inserted lines
pub const INSERT_OPEN: &str = "<ins class=\"diff-insert\">";
pub const INSERT_CLOSE: &str = "</ins>";

/// Opening/closing markers for deleted lines
pub const DELETE_OPEN: &str = "<del class=\"diff-delete\">";
pub const DELETE_CLOSE: &str = "</del>";

/// One line of diff output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLine<'a> {
    Same(&'a str),
    Inserted(&'a str),
    Deleted(&'a str),
}

/// Compare two line sequences
pub fn diff_lines<'a>(original: &[&'a str], revised: &[&'a str]) -> Vec<DiffLine<'a>> {
    let mut out = Vec::with_capacity(original.len().max(revised.len()));
    let (mut i, mut j) = (0, 0);

    while i < original.len() || j < revised.len() {
        match (original.get(i), revised.get(j)) {
            (Some(&a), Some(&b)) if a == b => {
                out.push(DiffLine::Same(a));
                i += 1;
                j += 1;
            }
            (Some(&a), Some(&b)) => {
                if revised.get(j + 1) == Some(&a) {
                    out.push(DiffLine::Inserted(b));
                    j += 1;
                } else if original.get(i + 1) == Some(&b) {
                    out.push(DiffLine::Deleted(a));
                    i += 1;
                } else {
                    out.push(DiffLine::Deleted(a));
                    out.push(DiffLine::Inserted(b));
                    i += 1;
                    j += 1;
                }
            }
            (Some(&a), None) => {
                out.push(DiffLine::Deleted(a));
                i += 1;
            }
            (None, Some(&b)) => {
                out.push(DiffLine::Inserted(b));
                j += 1;
            }
            (None, None) => break,
        }
    }

    out
}

/// Render the diff of `original` against `revised` as HTML markup, one
/// output line per diff line joined by "\n"
pub fn diff_markup(original: &str, revised: &str) -> String {
    let a: Vec<&str> = original.lines().collect();
    let b: Vec<&str> = revised.lines().collect();

    diff_lines(&a, &b)
        .iter()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_line(line: &DiffLine<'_>) -> String {
    match line {
        DiffLine::Same(text) => escape_html(text),
        DiffLine::Inserted(text) => format!("{}{}{}", INSERT_OPEN, escape_html(text), INSERT_CLOSE),
        DiffLine::Deleted(text) => format!("{}{}{}", DELETE_OPEN, escape_html(text), DELETE_CLOSE),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
