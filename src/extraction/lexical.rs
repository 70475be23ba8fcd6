//! Lexical extraction strategy: static vocabulary containment plus a small
//! set of trigger-phrase patterns.
//!
//! This is the model-free counterpart to the ONNX strategy. It serves two
//! roles: the fast path for short transcripts, and the degraded fallback
//! when model inference is unavailable. It implements [`NerModel`], so the
//! coordinator applies the same merging, negation, and dedup rules to its
//! output.

use std::sync::LazyLock;

use regex::Regex;

use super::ner::{NerModel, RawSpan};
use super::ExtractionError;

/// Confidence assigned to a vocabulary containment hit.
const VOCABULARY_CONFIDENCE: f32 = 0.95;

/// Confidence assigned to a trigger-phrase capture. Lower than vocabulary
/// hits — the captured word is unvetted.
const TRIGGER_CONFIDENCE: f32 = 0.75;

/// Common medicines recognized without a model.
const COMMON_DRUGS: &[&str] = &[
    "aspirin",
    "lisinopril",
    "amlodipine",
    "metformin",
    "atorvastatin",
    "simvastatin",
    "omeprazole",
    "losartan",
    "albuterol",
    "gabapentin",
    "hydrochlorothiazide",
    "metoprolol",
    "levothyroxine",
    "prednisone",
    "montelukast",
    "sertraline",
    "fluoxetine",
    "ibuprofen",
];

/// Common symptoms recognized without a model.
const COMMON_SYMPTOMS: &[&str] = &[
    "headache",
    "dizziness",
    "nausea",
    "fatigue",
    "cough",
    "rash",
    "fever",
    "swelling",
    "vomiting",
    "diarrhea",
    "constipation",
    "insomnia",
    "anxiety",
    "depression",
    "itching",
    "shortness of breath",
    "chest pain",
];

struct TriggerPattern {
    regex: Regex,
    label: &'static str,
}

/// Trigger phrases whose object is very likely a medicine mention.
static DRUG_TRIGGERS: LazyLock<Vec<TriggerPattern>> = LazyLock::new(|| {
    [
        r"\btaking\s+([a-z0-9][a-z0-9\-]*)",
        r"\bprescribed\s+([a-z0-9][a-z0-9\-]*)",
        r"\bmedication\s+([a-z0-9][a-z0-9\-]*)",
        r"\bmedicine\s+([a-z0-9][a-z0-9\-]*)",
        r"\bdrug\s+([a-z0-9][a-z0-9\-]*)",
    ]
    .iter()
    .map(|p| TriggerPattern {
        regex: Regex::new(p).expect("valid drug trigger regex"),
        label: "DRUG",
    })
    .collect()
});

/// Trigger phrases whose object is very likely a symptom mention.
static SYMPTOM_TRIGGERS: LazyLock<Vec<TriggerPattern>> = LazyLock::new(|| {
    [
        r"\bexperiencing\s+([a-z][a-z\-]*)",
        r"\bsuffering\s+from\s+([a-z][a-z\-]*)",
        r"\bsymptom\s+of\s+([a-z][a-z\-]*)",
        r"\bfeeling\s+([a-z][a-z\-]*)",
    ]
    .iter()
    .map(|p| TriggerPattern {
        regex: Regex::new(p).expect("valid symptom trigger regex"),
        label: "SYMPTOM",
    })
    .collect()
});

/// Words captured by triggers that are never entities themselves.
const TRIGGER_STOPWORDS: &[&str] = &[
    "a", "an", "any", "anything", "i", "it", "my", "nothing", "some", "something", "the", "this",
    "that", "them", "more", "less", "really", "very", "quite", "bit", "better", "worse", "fine",
    "okay", "well",
];

/// Vocabulary- and pattern-based scanner. Stateless and cheap; never fails.
pub struct LexicalScanner;

impl LexicalScanner {
    pub fn new() -> Self {
        Self
    }

    fn vocabulary_hits(&self, text: &str, terms: &[&str], label: &str) -> Vec<(usize, RawSpan)> {
        let mut hits = Vec::new();
        for term in terms {
            // Anchored at a word start so "rash" does not fire inside
            // "crash", while plural tails ("headaches") still hit.
            let pattern = format!(r"\b{}", regex::escape(term));
            let Ok(regex) = Regex::new(&pattern) else {
                continue;
            };
            for found in regex.find_iter(text) {
                hits.push((
                    found.start(),
                    RawSpan::new(*term, label, VOCABULARY_CONFIDENCE),
                ));
            }
        }
        hits
    }

    fn trigger_hits(&self, text: &str, triggers: &[TriggerPattern]) -> Vec<(usize, RawSpan)> {
        let mut hits = Vec::new();
        for trigger in triggers {
            for captures in trigger.regex.captures_iter(text) {
                let Some(word) = captures.get(1) else {
                    continue;
                };
                if TRIGGER_STOPWORDS.contains(&word.as_str()) {
                    continue;
                }
                hits.push((
                    word.start(),
                    RawSpan::new(word.as_str(), trigger.label, TRIGGER_CONFIDENCE),
                ));
            }
        }
        hits
    }
}

impl Default for LexicalScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl NerModel for LexicalScanner {
    fn annotate(&self, text: &str) -> Result<Vec<RawSpan>, ExtractionError> {
        let lowered = text.to_lowercase();

        let mut hits = self.vocabulary_hits(&lowered, COMMON_DRUGS, "DRUG");
        hits.extend(self.vocabulary_hits(&lowered, COMMON_SYMPTOMS, "SYMPTOM"));
        hits.extend(self.trigger_hits(&lowered, &DRUG_TRIGGERS));
        hits.extend(self.trigger_hits(&lowered, &SYMPTOM_TRIGGERS));

        // Order by position; drop lower-confidence duplicates of the same
        // surface text at the same position (a vocabulary hit and a trigger
        // capture can overlap).
        hits.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then(b.1.score.partial_cmp(&a.1.score).unwrap_or(std::cmp::Ordering::Equal))
        });
        hits.dedup_by(|a, b| a.0 == b.0 && a.1.text == b.1.text);

        Ok(hits.into_iter().map(|(_, span)| span).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_vocabulary_drugs_and_symptoms() {
        let scanner = LexicalScanner::new();
        let spans = scanner
            .annotate("I take Lisinopril and I have a headache")
            .unwrap();

        assert!(spans
            .iter()
            .any(|s| s.text == "lisinopril" && s.label == "DRUG"));
        assert!(spans
            .iter()
            .any(|s| s.text == "headache" && s.label == "SYMPTOM"));
    }

    #[test]
    fn vocabulary_hits_anchor_at_word_start() {
        let scanner = LexicalScanner::new();
        let spans = scanner.annotate("the car crashed").unwrap();
        assert!(
            spans.iter().all(|s| s.text != "rash"),
            "'rash' must not fire inside 'crashed'"
        );
    }

    #[test]
    fn vocabulary_matches_plural_surface_forms() {
        let scanner = LexicalScanner::new();
        let spans = scanner.annotate("having headaches lately").unwrap();
        assert!(spans
            .iter()
            .any(|s| s.text == "headache" && s.label == "SYMPTOM"));
    }

    #[test]
    fn trigger_captures_unknown_drug() {
        let scanner = LexicalScanner::new();
        let spans = scanner.annotate("I was prescribed zestoretic last week").unwrap();
        assert!(spans
            .iter()
            .any(|s| s.text == "zestoretic" && s.label == "DRUG"));
    }

    #[test]
    fn trigger_skips_stopwords() {
        let scanner = LexicalScanner::new();
        let spans = scanner.annotate("I am taking it every day").unwrap();
        assert!(spans.iter().all(|s| s.text != "it"));
    }

    #[test]
    fn multiword_symptom_is_found() {
        let scanner = LexicalScanner::new();
        let spans = scanner.annotate("some shortness of breath at night").unwrap();
        assert!(spans
            .iter()
            .any(|s| s.text == "shortness of breath" && s.label == "SYMPTOM"));
    }

    #[test]
    fn overlapping_vocabulary_and_trigger_deduped() {
        let scanner = LexicalScanner::new();
        let spans = scanner.annotate("I am taking aspirin").unwrap();
        let aspirin_hits = spans.iter().filter(|s| s.text == "aspirin").count();
        assert_eq!(aspirin_hits, 1);
    }

    #[test]
    fn never_fails_on_arbitrary_input() {
        let scanner = LexicalScanner::new();
        assert!(scanner.annotate("").unwrap().is_empty());
        assert!(scanner.annotate("???!!!   \n\t").unwrap().is_empty());
    }
}
