//! Agentic document-extraction service client
//!
//! Sends one page document per request and returns the service's chunk and
//! grounding structure untouched; flattening into rows happens in the
//! extractor stage.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};

use super::DocumentExtraction;

/// Client for the structured-extraction API.
pub struct AgenticExtractionClient {
    client: Client,
    config: ExtractionConfig,
}

impl AgenticExtractionClient {
    pub fn new(config: ExtractionConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }
}

#[async_trait]
impl DocumentExtraction for AgenticExtractionClient {
    async fn extract_chunks(&self, filename: &str, data: &[u8]) -> Result<Vec<ExtractedChunk>> {
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")
            .map_err(|e| Error::Internal(format!("invalid multipart payload: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("pdf", part)
            .text(
                "include_marginalia",
                self.config.include_marginalia.to_string(),
            )
            .text(
                "include_metadata_in_markdown",
                self.config.include_metadata_in_markdown.to_string(),
            );

        let mut request = self.client.post(&self.config.api_url).multipart(form);
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("Authorization", format!("Basic {}", api_key));
        }

        tracing::info!("[{}] sending to extraction service", filename);

        let response = request
            .send()
            .await
            .map_err(|e| Error::Service(format!("extraction request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Service(format!(
                "extraction service error ({}): {}",
                status, body
            )));
        }

        let parsed: ParseResponse = response
            .json()
            .await
            .map_err(|e| Error::Service(format!("failed to parse extraction response: {}", e)))?;

        tracing::info!(
            "[{}] extraction service returned {} chunks",
            filename,
            parsed.data.chunks.len()
        );

        Ok(parsed.data.chunks)
    }
}

/// One content unit identified by the extraction service within a page.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedChunk {
    /// Chunk category ("table", "text", "title", ...)
    #[serde(default)]
    pub chunk_type: String,
    /// Service-assigned identifier
    #[serde(default)]
    pub chunk_id: String,
    /// Chunk content; tables arrive as HTML
    #[serde(default)]
    pub text: String,
    /// Positional anchors; a chunk may carry several or none
    #[serde(default)]
    pub grounding: Vec<Grounding>,
}

/// Positional anchor associating a chunk with a location in the page.
#[derive(Debug, Clone, Deserialize)]
pub struct Grounding {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(rename = "box", default)]
    pub bounding_box: Option<BoundingBox>,
}

/// Normalized bounding box of a grounding.
#[derive(Debug, Clone, Deserialize)]
pub struct BoundingBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
}

// ============================================================================
// API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ParseResponse {
    data: ParseData,
}

#[derive(Debug, Default, Deserialize)]
struct ParseData {
    #[serde(default)]
    chunks: Vec<ExtractedChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_decoding_tolerates_missing_groundings() {
        let raw = r#"{
            "data": {
                "chunks": [
                    {"chunk_type": "title", "chunk_id": "c-1", "text": "INVOICE"},
                    {
                        "chunk_type": "table",
                        "chunk_id": "c-2",
                        "text": "<table></table>",
                        "grounding": [
                            {"page": 1, "box": {"l": 0.1, "t": 0.2, "r": 0.9, "b": 0.4}},
                            {"page": 1}
                        ]
                    }
                ]
            }
        }"#;

        let parsed: ParseResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.chunks.len(), 2);
        assert!(parsed.data.chunks[0].grounding.is_empty());
        assert_eq!(parsed.data.chunks[1].grounding.len(), 2);
        assert!(parsed.data.chunks[1].grounding[1].bounding_box.is_none());
    }
}
