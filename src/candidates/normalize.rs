use std::sync::LazyLock;

use regex::Regex;

static PAGE_OR_FIGURE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)page\s*\d+|fig(?:ure|\.)\s*\d+[:.]?").expect("noise regex is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Strip page and figure labels, collapse whitespace and trim.
pub fn normalize_text(raw: &str) -> String {
    let mut text = raw.to_string();

    // Removing one label can splice its neighbours into a new one.
    while PAGE_OR_FIGURE_NOISE.is_match(&text) {
        text = PAGE_OR_FIGURE_NOISE.replace_all(&text, "").into_owned();
    }

    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}
