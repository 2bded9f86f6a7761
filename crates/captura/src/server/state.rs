//! Application state for the capture server

use std::sync::Arc;

use crate::config::CapturaConfig;
use crate::error::Result;
use crate::providers::{
    AgenticExtractionClient, DocumentExtraction, InvoiceModel, OpenAiClient,
};
use crate::storage::StageStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration, built once at startup
    config: CapturaConfig,
    /// Storage areas for the four stages
    store: StageStore,
    /// Document-extraction collaborator
    extraction: Arc<dyn DocumentExtraction>,
    /// Generative-model collaborator
    model: Arc<dyn InvoiceModel>,
}

impl AppState {
    /// Create new application state; storage areas are created here.
    pub fn new(config: CapturaConfig) -> Result<Self> {
        let store = StageStore::new(&config.storage)?;
        tracing::info!("storage areas ready");

        let extraction: Arc<dyn DocumentExtraction> =
            Arc::new(AgenticExtractionClient::new(config.extraction.clone()));
        let model: Arc<dyn InvoiceModel> = Arc::new(OpenAiClient::new(config.model.clone()));
        tracing::info!("collaborator clients initialized (model: {})", model.model());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                extraction,
                model,
            }),
        })
    }

    pub fn config(&self) -> &CapturaConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &StageStore {
        &self.inner.store
    }

    pub fn extraction(&self) -> &dyn DocumentExtraction {
        self.inner.extraction.as_ref()
    }

    pub fn model(&self) -> &dyn InvoiceModel {
        self.inner.model.as_ref()
    }
}
