use std::sync::LazyLock;

use regex::Regex;

static NON_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize review text for embedding.
///
/// Hyphens and underscores become spaces, punctuation and digit runs are
/// removed, the result is lowercased and whitespace runs collapse to a single
/// space.
#[must_use]
pub fn preprocess_text(text: &str) -> String {
    let text = text.replace(['-', '_'], " ");
    let text = NON_WORD_RE.replace_all(&text, "");
    let text = DIGITS_RE.replace_all(&text, "");
    let text = text.to_lowercase();
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Number of whitespace-separated words in `text`.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
