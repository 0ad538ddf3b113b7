//! Helpers for turning composition markup into visible text

use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid break regex"));

/// Strip tags and decode the handful of entities editors emit.
pub fn to_plain_text(markup: &str) -> String {
    let with_breaks = BREAK.replace_all(markup, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Whether the markup renders to nothing but whitespace
pub fn is_visibly_empty(markup: &str) -> bool {
    to_plain_text(markup).trim().is_empty()
}

/// Plain-text preview limited to `max_chars` characters, ellipsized.
pub fn preview(markup: &str, max_chars: usize) -> String {
    let text = to_plain_text(markup);
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}
