pub mod analysis;
pub mod api;
pub mod config;
pub mod core_state;
pub mod detection;
pub mod extraction;
pub mod kb;
pub mod models;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use analysis::Analyzer;
use core_state::CoreState;
use extraction::{EntityExtractor, LexicalScanner, NerModel};
use kb::KnowledgeBase;

/// Run the analysis service: initialize tracing, load the knowledge base,
/// and serve the API.
///
/// A knowledge base load failure is not a crash: the server still comes up
/// and reports "not ready" on every analysis request, so operators see a
/// clear signal instead of a silently empty base.
pub async fn run() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("MedSafe starting v{}", config::APP_VERSION);

    let state = Arc::new(CoreState::new());

    let kb_path = config::knowledge_base_path();
    match KnowledgeBase::load(&kb_path) {
        Ok(kb) => {
            let kb = Arc::new(kb);
            let analyzer = Arc::new(Analyzer::new(
                EntityExtractor::new(primary_ner_model()),
                kb.clone(),
            ));
            if let Err(e) = state.set_ready(kb, analyzer) {
                tracing::error!(error = %e, "Failed to install analyzer state");
            }
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                path = %kb_path.display(),
                "Knowledge base load failed — service will report not ready"
            );
        }
    }

    let port = std::env::var("MEDSAFE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(config::DEFAULT_PORT);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!("Analysis API listening on {}", listener.local_addr()?);

    axum::serve(listener, api::analysis_router(state)).await
}

/// Pick the primary extraction strategy.
///
/// With the `onnx-ner` feature and a model on disk, that's the ONNX
/// token-classification model; otherwise the lexical scanner carries
/// extraction on its own.
fn primary_ner_model() -> Box<dyn NerModel> {
    #[cfg(feature = "onnx-ner")]
    {
        let model_dir = config::ner_model_dir();
        match extraction::OnnxNer::load(&model_dir) {
            Ok(model) => {
                return Box::new(model);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    dir = %model_dir.display(),
                    "ONNX NER unavailable — falling back to lexical extraction"
                );
            }
        }
    }
    Box::new(LexicalScanner::new())
}
