//! Clients for the pipeline's external collaborators
//!
//! Both collaborators are modeled as typed interfaces: a page document in,
//! chunks out; concatenated page text in, free-form model text out. All
//! output validation happens in the pipeline stages, not here.

pub mod extraction;
pub mod openai;

pub use extraction::{AgenticExtractionClient, ExtractedChunk, Grounding};
pub use openai::OpenAiClient;

use async_trait::async_trait;

use crate::error::Result;

/// Document-extraction collaborator: one page document in, a sequence of
/// typed chunks with groundings out.
#[async_trait]
pub trait DocumentExtraction: Send + Sync {
    async fn extract_chunks(&self, filename: &str, data: &[u8]) -> Result<Vec<ExtractedChunk>>;
}

/// Generative-model collaborator: concatenated page text in, one free-form
/// text response expected to contain the invoice schema JSON out.
#[async_trait]
pub trait InvoiceModel: Send + Sync {
    async fn generate_invoice_json(&self, page_text: &str) -> Result<String>;

    /// Model name, for logging
    fn model(&self) -> &str;
}
