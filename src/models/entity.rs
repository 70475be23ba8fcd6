//! Core record types flowing through the analysis pipeline.
//!
//! All of these are explicit tagged records with fixed fields — never
//! open-ended key/value maps — so the component contracts stay
//! type-checkable end to end.

use serde::{Deserialize, Serialize};

use super::enums::{EntityType, Severity};

/// A single entity mention produced by extraction. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    /// Surface text of the mention (lowercased by preprocessing).
    pub text: String,
    pub entity_type: EntityType,
    /// Extraction confidence in `[0, 1]`.
    pub confidence: f32,
    /// Byte offset of the mention within its preprocessed sentence.
    pub source_offset: usize,
}

impl EntitySpan {
    /// Conversation-wide dedup key: `(lowercased text, type)`.
    pub fn key(&self) -> (String, EntityType) {
        (self.text.to_lowercase(), self.entity_type)
    }
}

/// Outcome of one fuzzy-match query against the knowledge base.
///
/// `matched` is `None` iff no candidate met the acceptance threshold,
/// in which case `score` is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub query: String,
    pub matched: Option<String>,
    pub score: f32,
}

impl MatchResult {
    pub fn none(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            matched: None,
            score: 0.0,
        }
    }
}

/// A symptom that resolved against a drug's known reaction vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedSymptom {
    pub symptom: String,
    pub matched_reaction: String,
    pub confidence: f32,
}

/// One candidate adverse drug event: a medicine with at least one symptom
/// that resolved to a known reaction. Created fresh per analysis call;
/// matched-symptom entries are appended during aggregation and the record
/// is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdverseEventRecord {
    pub medicine: String,
    pub matched_drug: String,
    pub drug_match_confidence: f32,
    pub matched_symptoms: Vec<MatchedSymptom>,
    /// Worst-case severity across the drug's full known reaction set —
    /// not recomputed from the matched subset.
    pub severity: Severity,
}

/// Counts summarizing one analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub medicine_count: usize,
    pub symptom_count: usize,
    pub adverse_event_count: usize,
}

/// Full result of analyzing one conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub extracted_medicines: Vec<String>,
    pub extracted_symptoms: Vec<String>,
    pub adverse_events: Vec<AdverseEventRecord>,
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    /// Well-formed empty report — returned for empty input, never an error.
    pub fn empty() -> Self {
        Self {
            extracted_medicines: vec![],
            extracted_symptoms: vec![],
            adverse_events: vec![],
            summary: AnalysisSummary {
                medicine_count: 0,
                symptom_count: 0,
                adverse_event_count: 0,
            },
        }
    }

    /// Assemble a report from its parts, deriving the summary counts.
    pub fn new(
        extracted_medicines: Vec<String>,
        extracted_symptoms: Vec<String>,
        adverse_events: Vec<AdverseEventRecord>,
    ) -> Self {
        let summary = AnalysisSummary {
            medicine_count: extracted_medicines.len(),
            symptom_count: extracted_symptoms.len(),
            adverse_event_count: adverse_events.len(),
        };
        Self {
            extracted_medicines,
            extracted_symptoms,
            adverse_events,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_key_lowercases_text() {
        let span = EntitySpan {
            text: "Lisinopril".into(),
            entity_type: EntityType::Drug,
            confidence: 0.9,
            source_offset: 0,
        };
        assert_eq!(span.key(), ("lisinopril".to_string(), EntityType::Drug));
    }

    #[test]
    fn match_result_none_has_zero_score() {
        let result = MatchResult::none("tylenol");
        assert!(result.matched.is_none());
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn empty_report_is_well_formed() {
        let report = AnalysisReport::empty();
        assert!(report.extracted_medicines.is_empty());
        assert!(report.adverse_events.is_empty());
        assert_eq!(report.summary.medicine_count, 0);
    }

    #[test]
    fn report_summary_derives_counts() {
        let report = AnalysisReport::new(
            vec!["lisinopril".into()],
            vec!["cough".into(), "dizziness".into()],
            vec![],
        );
        assert_eq!(report.summary.medicine_count, 1);
        assert_eq!(report.summary.symptom_count, 2);
        assert_eq!(report.summary.adverse_event_count, 0);
    }

    #[test]
    fn report_serializes_with_snake_case_fields() {
        let json = serde_json::to_value(AnalysisReport::empty()).unwrap();
        assert!(json.get("extracted_medicines").is_some());
        assert!(json.get("summary").is_some());
    }
}
