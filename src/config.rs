use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedSafe";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default similarity threshold for matching an extracted medicine
/// against canonical drug names in the knowledge base.
pub const DRUG_MATCH_THRESHOLD: f32 = 0.8;

/// Default similarity threshold for matching an extracted symptom
/// against a drug's known reaction vocabulary.
pub const REACTION_MATCH_THRESHOLD: f32 = 0.7;

/// Default minimum NER confidence for an entity to survive extraction.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Transcripts shorter than this (in words) skip model inference and use
/// the lexical scanner directly.
pub const MIN_NER_WORDS: usize = 50;

/// Default port for the analysis API server.
pub const DEFAULT_PORT: u16 = 5000;

/// Get the application data directory
/// ~/MedSafe/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MedSafe")
}

/// Get the knowledge base file (drug → reaction → severity table).
/// Overridable via `MEDSAFE_KB` for tests and deployments.
pub fn knowledge_base_path() -> PathBuf {
    if let Ok(path) = std::env::var("MEDSAFE_KB") {
        return PathBuf::from(path);
    }
    app_data_dir().join("data").join("drug_reaction_mapping.csv")
}

/// Get the models directory (for the ONNX NER model, etc.)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the NER model directory (biomedical token-classification model).
pub fn ner_model_dir() -> PathBuf {
    models_dir().join("biomedical-ner")
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,medsafe=debug"
}
