//! The analysis entry point: one conversation transcript in, one
//! structured adverse-event report out.
//!
//! `Analyzer` owns its extraction strategies and a shared knowledge base
//! snapshot, injected at construction — there is no hidden global state.
//! Every call is a pure function of (transcript, knowledge base).

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{CONFIDENCE_THRESHOLD, MIN_NER_WORDS};
use crate::detection::{detect_adverse_events, DetectionConfig};
use crate::extraction::preprocess::word_count;
use crate::extraction::{EntityExtractor, LexicalScanner};
use crate::kb::KnowledgeBase;
use crate::models::{AnalysisReport, EntitySpan, EntityType};

/// Case-level symptom acceptance threshold.
///
/// Looser than the standalone matcher default so multi-word symptom
/// phrases still resolve to their head reaction ("dry cough" → "cough"
/// scores 5/9 under the length-ratio metric).
const CASE_REACTION_THRESHOLD: f32 = 0.5;

/// Conversation analyzer. Construct once at startup and share by
/// reference; safe for concurrent use.
pub struct Analyzer {
    primary: EntityExtractor,
    lexical: EntityExtractor,
    kb: Arc<KnowledgeBase>,
    detection: DetectionConfig,
}

impl Analyzer {
    /// Build an analyzer around a primary extraction strategy and a loaded
    /// knowledge base. A lexical strategy is always available as the
    /// short-transcript fast path and the degraded fallback.
    pub fn new(primary: EntityExtractor, kb: Arc<KnowledgeBase>) -> Self {
        Self {
            primary,
            lexical: EntityExtractor::new(Box::new(LexicalScanner::new())),
            kb,
            detection: DetectionConfig {
                reaction_threshold: CASE_REACTION_THRESHOLD,
                ..DetectionConfig::default()
            },
        }
    }

    /// Override the detection thresholds.
    pub fn with_detection(mut self, detection: DetectionConfig) -> Self {
        self.detection = detection;
        self
    }

    /// Analyze a conversation transcript for candidate adverse drug events.
    ///
    /// Always returns a well-formed report: empty input yields an empty
    /// report, and an unavailable extraction capability degrades to the
    /// lexical strategy — never an error.
    pub fn analyze(&self, conversation: &str) -> AnalysisReport {
        if conversation.trim().is_empty() {
            return AnalysisReport::empty();
        }

        let entities = self.extract_entities(conversation);

        let medicines = texts_of(&entities, &[EntityType::Drug]);
        // Disease mentions count as symptoms in context.
        let symptoms = texts_of(&entities, &[EntityType::Symptom, EntityType::Disease]);

        let adverse_events =
            detect_adverse_events(&medicines, &symptoms, &self.kb, self.detection);

        debug!(
            medicines = medicines.len(),
            symptoms = symptoms.len(),
            adverse_events = adverse_events.len(),
            "Conversation analyzed"
        );
        AnalysisReport::new(medicines, symptoms, adverse_events)
    }

    /// Run the appropriate extraction strategy for this transcript.
    fn extract_entities(&self, conversation: &str) -> Vec<EntitySpan> {
        // Short transcripts skip model inference entirely.
        if word_count(conversation) < MIN_NER_WORDS {
            debug!("Short transcript — lexical extraction only");
            return self
                .lexical
                .extract(conversation, None, CONFIDENCE_THRESHOLD);
        }

        let mut entities = match self.primary.try_extract(conversation, None, CONFIDENCE_THRESHOLD)
        {
            Ok(entities) => entities,
            Err(e) => {
                warn!(error = %e, "Primary extraction unavailable — lexical fallback");
                return self
                    .lexical
                    .extract(conversation, None, CONFIDENCE_THRESHOLD);
            }
        };

        self.augment_with_lexicon(conversation, &mut entities);
        entities
    }

    /// Add common-drug vocabulary hits the model missed.
    ///
    /// Runs through the same coordinator, so conversation-wide negation
    /// still dominates; only drug mentions not already present are added.
    fn augment_with_lexicon(&self, conversation: &str, entities: &mut Vec<EntitySpan>) {
        let known: Vec<(String, EntityType)> = entities.iter().map(EntitySpan::key).collect();
        let extra = self
            .lexical
            .extract(conversation, Some(EntityType::Drug), CONFIDENCE_THRESHOLD);

        let mut added = 0usize;
        for span in extra {
            if !known.contains(&span.key()) {
                entities.push(span);
                added += 1;
            }
        }
        if added > 0 {
            debug!(added, "Lexicon augmentation added drug mentions");
            entities.sort_by(|a, b| {
                a.entity_type
                    .as_str()
                    .cmp(b.entity_type.as_str())
                    .then_with(|| a.text.cmp(&b.text))
            });
        }
    }
}

/// Collect the sorted, deduplicated texts of entities of the given types.
fn texts_of(entities: &[EntitySpan], types: &[EntityType]) -> Vec<String> {
    let mut texts: Vec<String> = entities
        .iter()
        .filter(|e| types.contains(&e.entity_type))
        .map(|e| e.text.clone())
        .collect();
    texts.sort();
    texts.dedup();
    texts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::MockNer;
    use crate::kb::DrugKnowledgeEntry;
    use crate::models::Severity;
    use std::collections::BTreeSet;

    fn kb_entry(name: &str, reactions: &[&str], highest: Severity) -> DrugKnowledgeEntry {
        DrugKnowledgeEntry {
            drug_name: name.to_string(),
            reactions: reactions.iter().map(|r| r.to_string()).collect(),
            severities: BTreeSet::from([highest.as_str().to_string()]),
            highest_severity: highest,
        }
    }

    fn test_kb() -> Arc<KnowledgeBase> {
        Arc::new(KnowledgeBase::from_entries(vec![
            kb_entry(
                "lisinopril",
                &["cough", "angioedema"],
                Severity::NearCritical,
            ),
            kb_entry("aspirin", &["nausea", "tinnitus"], Severity::NeedsAttention),
        ]))
    }

    fn analyzer_with(ner: MockNer) -> Analyzer {
        Analyzer::new(EntityExtractor::new(Box::new(ner)), test_kb())
    }

    /// A transcript long enough (≥ 50 words) to take the model path.
    const LONG_TRANSCRIPT: &str = "Patient: I have been taking lisinopril for my blood \
        pressure for about a month now, but I have developed this persistent dry cough that \
        will not go away. Doctor: I see, and is it worse at any particular time of day? \
        Patient: It is worse at night, and it really interferes with my sleep every evening.";

    #[test]
    fn empty_input_yields_empty_report() {
        let analyzer = analyzer_with(MockNer::new(vec![]));
        let report = analyzer.analyze("   \n  ");
        assert_eq!(report, AnalysisReport::empty());
    }

    #[test]
    fn end_to_end_lisinopril_dry_cough() {
        let analyzer = analyzer_with(MockNer::new(vec![
            ("lisinopril", "DRUG", 0.95),
            ("dry cough", "SYMPTOM", 0.9),
        ]));

        let report = analyzer.analyze(LONG_TRANSCRIPT);

        assert_eq!(report.extracted_medicines, vec!["lisinopril"]);
        assert!(report
            .extracted_symptoms
            .contains(&"dry cough".to_string()));

        assert_eq!(report.adverse_events.len(), 1);
        let event = &report.adverse_events[0];
        assert_eq!(event.medicine, "lisinopril");
        assert_eq!(event.severity, Severity::NearCritical);
        assert_eq!(event.matched_symptoms.len(), 1);
        assert_eq!(event.matched_symptoms[0].symptom, "dry cough");
        assert_eq!(event.matched_symptoms[0].matched_reaction, "cough");

        assert_eq!(report.summary.medicine_count, 1);
        assert_eq!(report.summary.adverse_event_count, 1);
    }

    #[test]
    fn end_to_end_negated_swelling_spares_headaches() {
        let analyzer = analyzer_with(MockNer::new(vec![
            ("swelling", "SYMPTOM", 0.9),
            ("headaches", "SYMPTOM", 0.85),
        ]));

        let transcript = "Doctor: Are you experiencing any other symptoms today, like some \
            swelling in your ankles or your feet, or anything else that seems unusual to you? \
            Patient: No swelling, but some headaches. Doctor: How long have the headaches \
            been going on, and do they come mostly in the morning or the evening for you?";

        let report = analyzer.analyze(transcript);

        assert!(
            !report.extracted_symptoms.contains(&"swelling".to_string()),
            "negated in one sentence removes the mention conversation-wide"
        );
        assert!(report
            .extracted_symptoms
            .contains(&"headaches".to_string()));
    }

    #[test]
    fn analysis_is_idempotent() {
        let make = || {
            analyzer_with(MockNer::new(vec![
                ("lisinopril", "DRUG", 0.95),
                ("dry cough", "SYMPTOM", 0.9),
            ]))
        };
        assert_eq!(
            make().analyze(LONG_TRANSCRIPT),
            make().analyze(LONG_TRANSCRIPT)
        );
    }

    #[test]
    fn short_transcript_uses_lexical_scan() {
        // Under 50 words: a failing model must never be invoked.
        let analyzer = analyzer_with(MockNer::failing());
        let report = analyzer.analyze("I am taking aspirin and I have nausea.");

        assert_eq!(report.extracted_medicines, vec!["aspirin"]);
        assert!(report.extracted_symptoms.contains(&"nausea".to_string()));
        assert_eq!(report.adverse_events.len(), 1);
        assert_eq!(report.adverse_events[0].severity, Severity::NeedsAttention);
    }

    #[test]
    fn failing_model_falls_back_to_lexical() {
        let analyzer = analyzer_with(MockNer::failing());

        let transcript = "Patient: I have been taking aspirin every single morning for my \
            heart, as my previous doctor recommended quite a long time ago. Doctor: Have you \
            noticed anything unusual since then? Patient: Lately I have had constant nausea \
            after breakfast, and it has honestly been getting worse through the whole week.";
        assert!(word_count(transcript) >= MIN_NER_WORDS);

        let report = analyzer.analyze(transcript);
        assert_eq!(report.extracted_medicines, vec!["aspirin"]);
        assert_eq!(report.adverse_events.len(), 1);
    }

    #[test]
    fn lexicon_augmentation_recovers_missed_drug() {
        // Model only knows the symptom; the vocabulary supplies aspirin.
        let analyzer = analyzer_with(MockNer::new(vec![("nausea", "SYMPTOM", 0.9)]));

        let transcript = "Patient: I started taking aspirin a few weeks ago because of my \
            heart, and since then the mornings have been rough for me in several ways. \
            Doctor: Rough how, exactly, can you describe what you feel when you wake up? \
            Patient: Mostly nausea before breakfast, and it lasts until around midday.";
        assert!(word_count(transcript) >= MIN_NER_WORDS);

        let report = analyzer.analyze(transcript);
        assert!(report
            .extracted_medicines
            .contains(&"aspirin".to_string()));
        assert_eq!(report.adverse_events.len(), 1);
    }

    #[test]
    fn augmentation_cannot_resurrect_negated_drug() {
        let analyzer = analyzer_with(MockNer::new(vec![("nausea", "SYMPTOM", 0.9)]));

        let transcript = "Doctor: Are you currently taking anything for the pain, perhaps \
            something over the counter that you picked up yourself from the pharmacy? \
            Patient: No aspirin, I stopped it completely last year after the stomach trouble. \
            Doctor: Understood, and have you had any nausea or other discomfort since then? \
            Patient: Not really, doctor, on the whole things have honestly been fine.";
        assert!(word_count(transcript) >= MIN_NER_WORDS);

        let report = analyzer.analyze(transcript);
        assert!(
            !report
                .extracted_medicines
                .contains(&"aspirin".to_string()),
            "negated vocabulary hits stay excluded"
        );
    }

    #[test]
    fn unknown_terms_are_absent_not_errors() {
        let analyzer = analyzer_with(MockNer::new(vec![
            ("obscuritol", "DRUG", 0.99),
            ("toe tingling", "SYMPTOM", 0.9),
        ]));

        let transcript = "Patient: I have been taking obscuritol for several months now and \
            my toes will not stop tingling, which worries me a little bit more every day. \
            Doctor: That is not a medication I know well, let me look into it carefully. \
            Patient: Thank you, the toe tingling is mostly at night while I try to sleep.";

        let report = analyzer.analyze(transcript);
        assert!(report.adverse_events.is_empty());
        assert_eq!(report.summary.adverse_event_count, 0);
    }
}
