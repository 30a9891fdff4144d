use std::sync::LazyLock;

use regex::Regex;

use super::{SENTENCE_TOKEN_FLOOR, token_count};

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}|\r{2,}").expect("paragraph regex is valid"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n\r]").expect("line regex is valid"));

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex is valid"));

/// Paragraph candidates followed by sentence candidates.
pub fn segment(text: &str) -> Vec<String> {
    let mut candidates = split_paragraphs(text);
    candidates.extend(split_sentences(text));
    candidates
}

pub fn split_paragraphs(text: &str) -> Vec<String> {
    let paragraphs = split_trimmed(&PARAGRAPH_BREAK, text);
    if paragraphs.len() > 1 {
        return paragraphs;
    }
    split_trimmed(&LINE_BREAK, text)
}

/// Split after `.`, `!` or `?` followed by whitespace, keeping sentences
/// longer than three tokens.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;

    for boundary in SENTENCE_END.find_iter(text) {
        // The terminal mark is a single ASCII byte and stays with its sentence.
        push_sentence(&mut sentences, &text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    push_sentence(&mut sentences, &text[start..]);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.trim();
    if token_count(sentence) > SENTENCE_TOKEN_FLOOR {
        sentences.push(sentence.to_string());
    }
}

fn split_trimmed(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .split(text)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
