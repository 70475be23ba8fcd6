//! Sentence segmentation and text normalization applied before the
//! extraction capability runs.
//!
//! Normalization is pure text-to-text: lowercase, whole-word expansion of
//! a fixed medical abbreviation table, whitespace collapse. It exists to
//! improve extraction recall, not to change meaning.

use std::sync::LazyLock;

use regex::Regex;

/// Sentence boundary: `.`, `!` or `?` followed by whitespace.
static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary regex"));

/// Fixed medical abbreviation table, expanded whole-word before extraction.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("mg", "milligrams"),
    ("ml", "milliliters"),
    ("g", "grams"),
    ("mcg", "micrograms"),
    ("tabs", "tablets"),
    ("tab", "tablet"),
    ("caps", "capsules"),
    ("cap", "capsule"),
    ("inj", "injection"),
    ("soln", "solution"),
    ("susp", "suspension"),
    ("sr", "sustained release"),
    ("xr", "extended release"),
    ("prn", "as needed"),
    ("bid", "twice daily"),
    ("tid", "three times daily"),
    ("qid", "four times daily"),
    ("qd", "once daily"),
    ("po", "by mouth"),
    ("iv", "intravenous"),
    ("im", "intramuscular"),
    ("sc", "subcutaneous"),
];

static ABBREVIATION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ABBREVIATIONS
        .iter()
        .map(|(abbr, full)| {
            let regex = Regex::new(&format!(r"\b{abbr}\b")).expect("valid abbreviation regex");
            (regex, *full)
        })
        .collect()
});

/// Split a conversation into sentences. Empty sentences are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalize one sentence for extraction: lowercase, expand abbreviations
/// whole-word, collapse whitespace.
pub fn normalize_sentence(sentence: &str) -> String {
    let mut text = sentence.to_lowercase();
    for (regex, full) in ABBREVIATION_PATTERNS.iter() {
        text = regex.replace_all(&text, *full).into_owned();
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Word count used for the short-transcript fast path.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
