//! Transport-agnostic application state.
//!
//! `CoreState` is the single shared state behind the analysis API. It is
//! wrapped in `Arc` at startup; the knowledge base slot uses `RwLock` so
//! concurrent requests read without blocking each other, and writes happen
//! only once at load time. A request arriving before the knowledge base is
//! loaded observes `None` and must fail fast with a "not ready" signal —
//! never operate on a partial base.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::analysis::Analyzer;
use crate::kb::KnowledgeBase;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("knowledge base not loaded")]
    NotReady,
    #[error("state lock poisoned")]
    LockPoisoned,
}

/// Shared state for the analysis service.
pub struct CoreState {
    /// Loaded knowledge base. `None` until startup load completes.
    kb: RwLock<Option<Arc<KnowledgeBase>>>,
    /// The conversation analyzer. `None` until the knowledge base is set.
    analyzer: RwLock<Option<Arc<Analyzer>>>,
}

impl CoreState {
    /// Create an empty (not ready) state.
    pub fn new() -> Self {
        Self {
            kb: RwLock::new(None),
            analyzer: RwLock::new(None),
        }
    }

    /// Install the loaded knowledge base and its analyzer. Called once at
    /// startup after a successful load.
    pub fn set_ready(&self, kb: Arc<KnowledgeBase>, analyzer: Arc<Analyzer>) -> Result<(), CoreError> {
        {
            let mut slot = self.kb.write().map_err(|_| CoreError::LockPoisoned)?;
            *slot = Some(kb);
        }
        let mut slot = self.analyzer.write().map_err(|_| CoreError::LockPoisoned)?;
        *slot = Some(analyzer);
        Ok(())
    }

    /// Whether the knowledge base finished loading.
    pub fn is_ready(&self) -> bool {
        self.kb.read().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Number of drugs in the loaded knowledge base (0 when not ready).
    pub fn drug_count(&self) -> usize {
        self.kb
            .read()
            .ok()
            .and_then(|slot| slot.as_ref().map(|kb| kb.len()))
            .unwrap_or(0)
    }

    /// Get the analyzer, or a not-ready error before load completes.
    pub fn analyzer(&self) -> Result<Arc<Analyzer>, CoreError> {
        self.analyzer
            .read()
            .map_err(|_| CoreError::LockPoisoned)?
            .clone()
            .ok_or(CoreError::NotReady)
    }
}

impl Default for CoreState {
    fn default() -> Self {
        Self::new()
    }
}
