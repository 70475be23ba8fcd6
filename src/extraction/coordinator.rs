//! Conversation-level entity extraction.
//!
//! Orchestrates the per-sentence pipeline: preprocess → annotate → merge
//! sub-word spans → negation scan, then applies the conversation-wide
//! rules: union-of-negation suppression, max-confidence dedup, filtering,
//! and a deterministic sort.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::config::CONFIDENCE_THRESHOLD;
use crate::models::{EntitySpan, EntityType};

use super::negation::is_negated;
use super::ner::{NerModel, RawSpan};
use super::preprocess::{normalize_sentence, split_sentences};
use super::ExtractionError;

/// Entity extraction over a conversation transcript, generic over the
/// underlying [`NerModel`] strategy (model-backed or lexical).
pub struct EntityExtractor {
    ner: Box<dyn NerModel>,
}

impl EntityExtractor {
    pub fn new(ner: Box<dyn NerModel>) -> Self {
        Self { ner }
    }

    /// Extract deduplicated, negation-filtered entities from a transcript.
    ///
    /// Sentence-level annotation calls are independent, but the output is
    /// sorted by `(type, text)` so ordering never depends on processing
    /// order.
    pub fn try_extract(
        &self,
        text: &str,
        type_filter: Option<EntityType>,
        confidence_threshold: f32,
    ) -> Result<Vec<EntitySpan>, ExtractionError> {
        let mut negated: HashSet<(String, EntityType)> = HashSet::new();
        let mut accumulated: Vec<EntitySpan> = Vec::new();

        for sentence in split_sentences(text) {
            let prepped = normalize_sentence(sentence);
            if prepped.is_empty() {
                continue;
            }

            let raw = self.ner.annotate(&prepped)?;
            for span in merge_adjacent_spans(&prepped, raw) {
                if is_negated(&prepped, &span.text) {
                    negated.insert(span.key());
                } else {
                    accumulated.push(span);
                }
            }
        }

        // Union-of-negation: any negated occurrence removes the key even if
        // non-negated occurrences exist, regardless of confidence. Among
        // survivors, the max-confidence occurrence wins.
        let mut best: HashMap<(String, EntityType), EntitySpan> = HashMap::new();
        for span in accumulated {
            let key = span.key();
            if negated.contains(&key) {
                continue;
            }
            match best.get(&key) {
                Some(held) if held.confidence >= span.confidence => {}
                _ => {
                    best.insert(key, span);
                }
            }
        }

        let mut result: Vec<EntitySpan> = best
            .into_values()
            .filter(|span| type_filter.map_or(true, |t| span.entity_type == t))
            .filter(|span| span.confidence >= confidence_threshold)
            .collect();
        result.sort_by(|a, b| {
            a.entity_type
                .as_str()
                .cmp(b.entity_type.as_str())
                .then_with(|| a.text.cmp(&b.text))
        });

        debug!(
            entities = result.len(),
            negated = negated.len(),
            "Conversation extraction complete"
        );
        Ok(result)
    }

    /// Degraded extraction: an unavailable or failing capability yields an
    /// empty list, never an error. Callers treat "no entities" as a valid
    /// result and may fall back to the lexical strategy.
    pub fn extract(
        &self,
        text: &str,
        type_filter: Option<EntityType>,
        confidence_threshold: f32,
    ) -> Vec<EntitySpan> {
        match self.try_extract(text, type_filter, confidence_threshold) {
            Ok(entities) => entities,
            Err(e) => {
                warn!(error = %e, "Extraction degraded to empty result");
                vec![]
            }
        }
    }

    /// Extraction with the default confidence threshold and no type filter.
    pub fn extract_default(&self, text: &str) -> Vec<EntitySpan> {
        self.extract(text, None, CONFIDENCE_THRESHOLD)
    }
}

/// Merge adjacent same-type raw spans into full mentions.
///
/// Two spans merge when the second one's text starts immediately after the
/// first one's text plus a single separating character in the preprocessed
/// sentence — i.e. they were contiguous before tokenization split them.
/// Merged confidence is the arithmetic mean of all constituent scores.
/// Spans whose label is not a known entity type are skipped.
fn merge_adjacent_spans(sentence: &str, raw: Vec<RawSpan>) -> Vec<EntitySpan> {
    struct Open {
        text: String,
        entity_type: EntityType,
        offset: usize,
        score_sum: f32,
        score_count: u32,
    }

    impl Open {
        fn close(self) -> EntitySpan {
            EntitySpan {
                text: self.text,
                entity_type: self.entity_type,
                confidence: self.score_sum / self.score_count as f32,
                source_offset: self.offset,
            }
        }
    }

    let mut merged: Vec<EntitySpan> = Vec::new();
    let mut open: Option<Open> = None;

    for span in raw {
        let Ok(entity_type) = EntityType::from_str(&span.label) else {
            debug!(label = %span.label, "Skipping span with unknown label");
            continue;
        };
        let position = sentence.find(&span.text);

        if let Some(current) = open.take() {
            let contiguous = position
                .is_some_and(|pos| pos == current.offset + current.text.len() + 1);
            if entity_type == current.entity_type && contiguous {
                let separator = sentence[current.offset + current.text.len()..]
                    .chars()
                    .next()
                    .unwrap_or(' ');
                let mut grown = current;
                grown.text.push(separator);
                grown.text.push_str(&span.text);
                grown.score_sum += span.score;
                grown.score_count += 1;
                open = Some(grown);
                continue;
            }
            merged.push(current.close());
        }

        open = Some(Open {
            text: span.text,
            entity_type,
            offset: position.unwrap_or(0),
            score_sum: span.score,
            score_count: 1,
        });
    }

    if let Some(current) = open {
        merged.push(current.close());
    }

    merged
}
