pub mod coordinator;
pub mod lexical;
pub mod negation;
pub mod ner;
pub mod preprocess;

pub use coordinator::EntityExtractor;
pub use lexical::LexicalScanner;
pub use ner::{MockNer, NerModel, RawSpan};
#[cfg(feature = "onnx-ner")]
pub use ner::OnnxNer;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("NER model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("NER model initialization failed: {0}")]
    ModelInit(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}
