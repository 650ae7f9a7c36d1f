//! Cleanup for free-text error strings reported by the aggregation service.
//!
//! Upstream messages are untrusted. Before they are stored or surfaced they
//! have markup stripped, are capped at [`MAX_WARNING_CHARS`] characters and
//! have HTML-significant characters escaped.

use std::sync::OnceLock;

use regex::Regex;

pub const MAX_WARNING_CHARS: usize = 500;

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Strip tags, cap length, then escape. Length is counted before escaping.
pub fn sanitize_warning(raw: &str) -> String {
    let stripped = tag_pattern().replace_all(raw, "");
    let capped: String = stripped.trim().chars().take(MAX_WARNING_CHARS).collect();
    escape_html(&capped)
}

pub fn sanitize_warnings<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|w| sanitize_warning(w.as_ref()))
        .filter(|w| !w.is_empty())
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
