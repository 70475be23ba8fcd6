//! The named-entity-recognition capability contract and its
//! implementations.
//!
//! The pipeline consumes NER strictly through [`NerModel`]: arbitrary
//! natural-language input in, raw `(text, label, score)` spans out. Spans
//! may be sub-word fragments — reassembling them into full mentions is the
//! coordinator's job, not the model's.

use super::ExtractionError;

/// A raw span as produced by the extraction capability. `label` is the
/// model's tag (e.g. `DRUG`), which may or may not map to a known
/// [`crate::models::EntityType`].
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpan {
    pub text: String,
    pub label: String,
    pub score: f32,
}

impl RawSpan {
    pub fn new(text: impl Into<String>, label: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            score,
        }
    }
}

/// Sequence-labeling capability over natural-language text.
///
/// Implementations must tolerate arbitrary input. A call is one
/// coarse-grained blocking operation with no partial results; timeout
/// policy belongs to the caller wrapping the whole call.
pub trait NerModel: Send + Sync {
    fn annotate(&self, text: &str) -> Result<Vec<RawSpan>, ExtractionError>;
}

// ═══════════════════════════════════════════════════════════
// ONNX NER — behind `onnx-ner` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-ner")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ort::session::Session;

    use super::{NerModel, RawSpan};
    use crate::extraction::ExtractionError;

    /// Token-classification NER backed by ONNX Runtime.
    ///
    /// Requires three files in the model directory:
    /// - `model.onnx` — token-classification head weights
    /// - `tokenizer.json` — HuggingFace tokenizer definition
    /// - `labels.txt` — one tag per line, index = class id (BIO scheme)
    ///
    /// Uses interior mutability (Mutex) because ort::Session::run requires
    /// `&mut self` but `NerModel` exposes `&self` for shared usage.
    pub struct OnnxNer {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
        labels: Vec<String>,
    }

    impl OnnxNer {
        /// Load the NER model from a directory.
        pub fn load(model_dir: &Path) -> Result<Self, ExtractionError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");
            let labels_path = model_dir.join("labels.txt");

            for path in [&model_path, &tokenizer_path, &labels_path] {
                if !path.exists() {
                    return Err(ExtractionError::ModelNotFound(path.clone()));
                }
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| ExtractionError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| ExtractionError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| {
                    ExtractionError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| ExtractionError::ModelInit(format!("Tokenizer load failed: {e}")))?;

            let labels: Vec<String> = std::fs::read_to_string(&labels_path)?
                .lines()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            if labels.is_empty() {
                return Err(ExtractionError::ModelInit("labels.txt is empty".into()));
            }

            tracing::info!(
                labels = labels.len(),
                "ONNX NER model loaded from {}",
                model_dir.display()
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                labels,
            })
        }

        /// Tokenize, run inference, and decode per-token tags into spans.
        fn infer(&self, text: &str) -> Result<Vec<RawSpan>, ExtractionError> {
            use ort::value::TensorRef;

            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| ExtractionError::Tokenization(e.to_string()))?;

            let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let attention_mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let token_type_ids: Vec<i64> = encoding
                .get_type_ids()
                .iter()
                .map(|&t| t as i64)
                .collect();

            let seq_len = input_ids.len();
            if seq_len == 0 {
                return Ok(vec![]);
            }

            let ids_array = ndarray::Array2::from_shape_vec((1, seq_len), input_ids)
                .map_err(|e| ExtractionError::Inference(e.to_string()))?;
            let mask_array = ndarray::Array2::from_shape_vec((1, seq_len), attention_mask)
                .map_err(|e| ExtractionError::Inference(e.to_string()))?;
            let type_array = ndarray::Array2::from_shape_vec((1, seq_len), token_type_ids)
                .map_err(|e| ExtractionError::Inference(e.to_string()))?;

            let ids_tensor = TensorRef::from_array_view(&ids_array)
                .map_err(|e| ExtractionError::Inference(e.to_string()))?;
            let mask_tensor = TensorRef::from_array_view(&mask_array)
                .map_err(|e| ExtractionError::Inference(e.to_string()))?;
            let type_tensor = TensorRef::from_array_view(&type_array)
                .map_err(|e| ExtractionError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| ExtractionError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
                .map_err(|e| ExtractionError::Inference(format!("ONNX inference failed: {e}")))?;

            // Logits shape: [1, seq_len, num_labels]
            let (shape, logits) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| ExtractionError::Inference(format!("Output extraction: {e}")))?;

            let num_labels = self.labels.len();
            if shape.len() != 3 || shape[2] as usize != num_labels {
                return Err(ExtractionError::Inference(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {seq_len}, {num_labels}]"
                )));
            }

            Ok(self.decode_tags(&encoding, logits, seq_len, num_labels))
        }

        /// Turn per-token logits into word-level spans.
        ///
        /// Special tokens are skipped; `O` tags are skipped; wordpiece
        /// continuations (`##`) are glued to the previous span with their
        /// scores averaged. BIO prefixes are stripped so the caller sees
        /// the bare entity label.
        fn decode_tags(
            &self,
            encoding: &tokenizers::Encoding,
            logits: &[f32],
            seq_len: usize,
            num_labels: usize,
        ) -> Vec<RawSpan> {
            let tokens = encoding.get_tokens();
            let special = encoding.get_special_tokens_mask();

            let mut spans: Vec<RawSpan> = Vec::new();
            let mut open_scores: Vec<f32> = Vec::new();

            for idx in 0..seq_len {
                if special.get(idx).copied().unwrap_or(1) == 1 {
                    continue;
                }
                let row = &logits[idx * num_labels..(idx + 1) * num_labels];
                let (class, prob) = softmax_argmax(row);
                let tag = &self.labels[class];
                if tag == "O" {
                    continue;
                }
                let label = tag.rsplit('-').next().unwrap_or(tag).to_string();
                let token = &tokens[idx];

                if let Some(fragment) = token.strip_prefix("##") {
                    // Same-word continuation — extend the open span.
                    if let Some(last) = spans.last_mut() {
                        if last.label == label {
                            last.text.push_str(fragment);
                            open_scores.push(prob);
                            last.score =
                                open_scores.iter().sum::<f32>() / open_scores.len() as f32;
                            continue;
                        }
                    }
                }

                let clean = token.strip_prefix("##").unwrap_or(token);
                open_scores.clear();
                open_scores.push(prob);
                spans.push(RawSpan::new(clean, label, prob));
            }

            spans
        }
    }

    /// Softmax over one logit row, returning (argmax index, probability).
    fn softmax_argmax(row: &[f32]) -> (usize, f32) {
        let max_logit = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp: Vec<f32> = row.iter().map(|&x| (x - max_logit).exp()).collect();
        let sum: f32 = exp.iter().sum();
        let (idx, val) = exp
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((0, &1.0));
        (idx, if sum > 0.0 { val / sum } else { 0.0 })
    }

    impl NerModel for OnnxNer {
        fn annotate(&self, text: &str) -> Result<Vec<RawSpan>, ExtractionError> {
            self.infer(text)
        }
    }
}

#[cfg(feature = "onnx-ner")]
pub use onnx::OnnxNer;

// ═══════════════════════════════════════════════════════════
// Mock NER (testing)
// ═══════════════════════════════════════════════════════════

/// Mock NER model for testing — returns spans for configured vocabulary
/// terms found in the input, in order of appearance.
pub struct MockNer {
    vocabulary: Vec<(String, String, f32)>,
    fail: bool,
}

impl MockNer {
    /// Build a mock that tags each `(term, label, score)` wherever the
    /// term occurs in the input text.
    pub fn new(vocabulary: Vec<(&str, &str, f32)>) -> Self {
        Self {
            vocabulary: vocabulary
                .into_iter()
                .map(|(t, l, s)| (t.to_string(), l.to_string(), s))
                .collect(),
            fail: false,
        }
    }

    /// A mock that errors on every call — exercises degraded paths.
    pub fn failing() -> Self {
        Self {
            vocabulary: vec![],
            fail: true,
        }
    }
}

impl NerModel for MockNer {
    fn annotate(&self, text: &str) -> Result<Vec<RawSpan>, ExtractionError> {
        if self.fail {
            return Err(ExtractionError::Inference("mock inference failure".into()));
        }

        let mut hits: Vec<(usize, RawSpan)> = Vec::new();
        for (term, label, score) in &self.vocabulary {
            let mut search = 0;
            while let Some(found) = text[search..].find(term.as_str()) {
                let at = search + found;
                hits.push((at, RawSpan::new(term.clone(), label.clone(), *score)));
                search = at + term.len();
            }
        }
        hits.sort_by_key(|(at, _)| *at);
        Ok(hits.into_iter().map(|(_, span)| span).collect())
    }
}
