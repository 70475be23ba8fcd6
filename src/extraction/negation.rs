//! Sentence-local negation scoping.
//!
//! A mention is negated when a negation cue immediately precedes its text
//! in the same sentence. Scope never crosses a sentence boundary here;
//! conversation-wide suppression is the coordinator's union-of-negation
//! rule over the keys this scanner reports.

use regex::Regex;
use tracing::trace;

/// Negation cues tested immediately before the entity text.
const NEGATION_CUES: &[&str] = &[
    "no",
    "not",
    "without",
    "deny",
    "denies",
    "negative for",
    "free of",
];

/// Decide whether `entity_text` is negated within `sentence_lower`.
///
/// Both inputs are expected lowercased (the coordinator passes
/// preprocessed sentences). Union semantics: any one cue matching is
/// enough. Cues carry a leading word boundary, so "casino swelling" is
/// not a negation of "swelling".
pub fn is_negated(sentence_lower: &str, entity_text: &str) -> bool {
    let entity = entity_text.trim().to_lowercase();
    if entity.is_empty() {
        return false;
    }

    let cues = NEGATION_CUES
        .iter()
        .map(|cue| cue.replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"\b(?:{cues})\s+{}", regex::escape(&entity));
    let Ok(regex) = Regex::new(&pattern) else {
        return false;
    };

    let negated = regex.is_match(sentence_lower);
    if negated {
        trace!(entity = %entity, "Negated mention");
    }
    negated
}
