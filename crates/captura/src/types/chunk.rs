//! Row model for extracted chunk tables

use serde::{Deserialize, Serialize};

/// One observation row of a chunk table: a (chunk, grounding) pair, or a
/// chunk with no groundings at all.
///
/// Field order is the authoritative column order of the CSV artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Identifier assigned by the extraction service
    pub chunk_id: String,
    /// 1-based position of the chunk within the page
    pub chunk_sequence: u32,
    /// Chunk category as reported by the service ("table", "text", ...)
    pub chunk_type: String,
    /// Chunk content as emitted by the service; tables arrive as HTML
    pub raw_content: String,
    /// Original document name (e.g. `covalca_3.pdf`)
    pub source_file: String,
    /// Public URL of the original document
    pub source_url: String,
    /// Page number carried in the page-unit filename, as text
    pub page: String,
    /// Constant "1"
    pub active: String,
    /// Capture time, ISO-8601 with the fixed capture offset
    pub capture_timestamp: String,
    /// Constant capture subject
    pub capture_subject: String,
    /// Parsed table representation for table chunks, raw content otherwise;
    /// never empty for a non-empty chunk
    pub normalized_text: String,
}

impl ChunkRecord {
    /// Column names in artifact order; must match the serde field names.
    pub const COLUMNS: [&'static str; 11] = [
        "chunk_id",
        "chunk_sequence",
        "chunk_type",
        "raw_content",
        "source_file",
        "source_url",
        "page",
        "active",
        "capture_timestamp",
        "capture_subject",
        "normalized_text",
    ];
}
