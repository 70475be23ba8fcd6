//! Adverse-event detection: combine extracted medicines and symptoms with
//! the knowledge base into case-level records.
//!
//! Pure functions over a read-only knowledge base snapshot — no state, no
//! side effects beyond logging.

use tracing::debug;

use crate::config::{DRUG_MATCH_THRESHOLD, REACTION_MATCH_THRESHOLD};
use crate::kb::matcher::{find_closest_drug, match_symptom_to_reactions};
use crate::kb::KnowledgeBase;
use crate::models::{AdverseEventRecord, MatchedSymptom};

/// Matching thresholds for one detection pass.
#[derive(Debug, Clone, Copy)]
pub struct DetectionConfig {
    pub drug_threshold: f32,
    pub reaction_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            drug_threshold: DRUG_MATCH_THRESHOLD,
            reaction_threshold: REACTION_MATCH_THRESHOLD,
        }
    }
}

/// Detect candidate adverse events among extracted medicines and symptoms.
///
/// Per medicine: resolve against canonical drug names; unresolved
/// medicines produce no record. Per symptom: resolve against the matched
/// drug's reaction vocabulary; unresolved symptoms are skipped. A record
/// is emitted only when at least one symptom resolved.
///
/// The record's severity is the entry's precomputed worst case across its
/// full known reaction set — deliberately not recomputed from the matched
/// subset, so it reflects overall risk for the drug.
pub fn detect_adverse_events(
    medicines: &[String],
    symptoms: &[String],
    kb: &KnowledgeBase,
    config: DetectionConfig,
) -> Vec<AdverseEventRecord> {
    let mut events = Vec::new();

    for medicine in medicines {
        let drug_match = find_closest_drug(kb, medicine, config.drug_threshold);
        let Some(matched_drug) = drug_match.matched else {
            debug!(medicine = %medicine, "No knowledge base match for medicine");
            continue;
        };
        let Some(entry) = kb.entry(&matched_drug) else {
            continue;
        };

        let mut matched_symptoms = Vec::new();
        for symptom in symptoms {
            let reaction_match =
                match_symptom_to_reactions(symptom, &entry.reactions, config.reaction_threshold);
            if let Some(matched_reaction) = reaction_match.matched {
                matched_symptoms.push(MatchedSymptom {
                    symptom: symptom.clone(),
                    matched_reaction,
                    confidence: reaction_match.score,
                });
            }
        }

        if matched_symptoms.is_empty() {
            continue;
        }

        debug!(
            medicine = %medicine,
            drug = %entry.drug_name,
            symptoms = matched_symptoms.len(),
            severity = entry.highest_severity.as_str(),
            "Adverse event candidate"
        );
        events.push(AdverseEventRecord {
            medicine: medicine.clone(),
            matched_drug: entry.drug_name.clone(),
            drug_match_confidence: drug_match.score,
            matched_symptoms,
            severity: entry.highest_severity,
        });
    }

    events
}
