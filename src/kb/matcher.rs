//! Fuzzy matching of extracted terms against the knowledge base.
//!
//! Pharmaceutical names and clinical terms frequently appear as prefixes or
//! suffixes of their canonical form (brand vs. generic naming,
//! pluralization), so matching is containment-based with a length-ratio
//! score rather than an edit distance. Short-substring false positives are
//! suppressed by the acceptance thresholds.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::{DRUG_MATCH_THRESHOLD, REACTION_MATCH_THRESHOLD};
use crate::models::MatchResult;

use super::KnowledgeBase;

/// Normalize a term for matching: lowercase, strip non-word characters,
/// collapse whitespace.
pub fn normalize_term(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '_')
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Containment-weighted length-ratio score between two normalized terms.
///
/// Eligible only when one term contains the other; the score is
/// `min(len) / max(len)` over character counts. Returns `None` when
/// neither contains the other or either side is empty.
pub fn containment_score(query: &str, candidate: &str) -> Option<f32> {
    if query.is_empty() || candidate.is_empty() {
        return None;
    }
    if !query.contains(candidate) && !candidate.contains(query) {
        return None;
    }
    let q_len = query.chars().count() as f32;
    let c_len = candidate.chars().count() as f32;
    Some(q_len.min(c_len) / q_len.max(c_len))
}

/// Find the best-scoring candidate for `query` among `candidates`.
///
/// Strictly higher score wins. Equal scores break toward the
/// lexicographically smallest candidate — an explicit policy so the result
/// never depends on iteration order.
fn best_match<'a, I>(query: &str, candidates: I) -> Option<(&'a str, f32)>
where
    I: IntoIterator<Item = &'a str>,
{
    let normalized_query = normalize_term(query);
    if normalized_query.is_empty() {
        return None;
    }

    let mut best: Option<(&str, f32)> = None;
    for candidate in candidates {
        let normalized_candidate = normalize_term(candidate);
        let Some(score) = containment_score(&normalized_query, &normalized_candidate) else {
            continue;
        };
        best = match best {
            None => Some((candidate, score)),
            Some((held, held_score)) => {
                if score > held_score || (score == held_score && candidate < held) {
                    Some((candidate, score))
                } else {
                    Some((held, held_score))
                }
            }
        };
    }
    best
}

/// Match one term against a candidate vocabulary with an acceptance
/// threshold. Below-threshold best scores come back as a no-match.
pub fn match_term<'a, I>(query: &str, candidates: I, threshold: f32) -> MatchResult
where
    I: IntoIterator<Item = &'a str>,
{
    match best_match(query, candidates) {
        Some((name, score)) if score >= threshold => {
            debug!(query, matched = name, score, "Term matched");
            MatchResult {
                query: query.to_string(),
                matched: Some(name.to_string()),
                score,
            }
        }
        _ => MatchResult::none(query),
    }
}

/// Fuzzy-match an extracted medicine name against the canonical drug
/// names in the knowledge base.
pub fn find_closest_drug(kb: &KnowledgeBase, name: &str, threshold: f32) -> MatchResult {
    match_term(
        name,
        kb.entries().iter().map(|e| e.drug_name.as_str()),
        threshold,
    )
}

/// Fuzzy-match a medicine name with the default drug threshold.
pub fn find_closest_drug_default(kb: &KnowledgeBase, name: &str) -> MatchResult {
    find_closest_drug(kb, name, DRUG_MATCH_THRESHOLD)
}

/// Fuzzy-match an extracted symptom against a drug's reaction vocabulary.
pub fn match_symptom_to_reactions(
    symptom: &str,
    reactions: &BTreeSet<String>,
    threshold: f32,
) -> MatchResult {
    match_term(symptom, reactions.iter().map(|r| r.as_str()), threshold)
}

/// Fuzzy-match a symptom with the default reaction threshold.
pub fn match_symptom_default(symptom: &str, reactions: &BTreeSet<String>) -> MatchResult {
    match_symptom_to_reactions(symptom, reactions, REACTION_MATCH_THRESHOLD)
}
