//! Extractor stage: page documents into chunk tables
//!
//! One extraction-service call per page unit. The service's nested
//! chunk/grounding structure flattens into one row per (chunk, grounding)
//! pair, and every row gets a normalized plain-text column: parsed
//! row-tuples for table chunks, raw content for everything else.

use chrono::{FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::{DocumentExtraction, ExtractedChunk};
use crate::storage::{create_artifact, StageStore};
use crate::types::ChunkRecord;

/// Constant "active" flag stamped on every chunk row.
pub const ACTIVE_FLAG: &str = "1";
/// Constant capture subject stamped on every chunk row.
pub const CAPTURE_SUBJECT: &str = "captura";

static PAGE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<base>.+?)_page_(?P<page>\d+)\.(?i:pdf)$").unwrap());

/// Outcome of a successful extraction.
#[derive(Debug)]
pub struct ExtractOutcome {
    /// Original document the page came from
    pub source_document: String,
    /// Page number, as text
    pub page: String,
    /// Rows written to the chunk table
    pub rows: usize,
    /// Name of the chunk-table artifact
    pub table_name: String,
}

/// Extract `filename` (a page unit in the pages area) into a chunk-table
/// CSV in the chunks area, then remove the consumed page unit.
pub async fn extract_page(
    store: &StageStore,
    client: &dyn DocumentExtraction,
    public_base_url: &str,
    filename: &str,
) -> Result<ExtractOutcome> {
    let path = StageStore::resolve(store.pages(), filename)?;
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "no such page document in pages: {}",
            filename
        )));
    }

    let source_document = original_document_name(filename)?;
    let page = page_number(filename).unwrap_or_default();

    let data = fs::read(&path)?;
    let chunks = client.extract_chunks(filename, &data).await?;

    let context = RowContext {
        source_file: source_document.clone(),
        source_url: format!(
            "{}/{}",
            public_base_url.trim_end_matches('/'),
            source_document
        ),
        page: page.clone(),
        capture_timestamp: capture_timestamp(),
    };
    let records = flatten_chunks(&chunks, &context);

    let table_name = chunk_table_name(&source_document, &page);
    let output = store.chunks().join(&table_name);
    write_records(&records, &output)?;

    StageStore::remove_consumed(&path)?;
    tracing::info!(
        "extracted '{}': {} rows into {}",
        filename,
        records.len(),
        table_name
    );

    Ok(ExtractOutcome {
        source_document,
        page,
        rows: records.len(),
        table_name,
    })
}

/// Derive the original document name from a page-unit filename.
/// `covalca_3_page_16.pdf` -> `covalca_3.pdf`.
pub fn original_document_name(filename: &str) -> Result<String> {
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(Error::UnsupportedType(format!(
            "expected a .pdf page document: {}",
            filename
        )));
    }
    match PAGE_SUFFIX.captures(filename) {
        Some(caps) => Ok(format!("{}.pdf", &caps["base"])),
        None => {
            let stem = Path::new(filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(filename);
            Ok(format!("{}.pdf", stem))
        }
    }
}

/// Page number carried in the `_page_<digits>` suffix, as text.
pub fn page_number(filename: &str) -> Option<String> {
    PAGE_SUFFIX
        .captures(filename)
        .map(|caps| caps["page"].to_string())
}

/// Chunk-table artifact name for a (document, page) pair.
pub fn chunk_table_name(source_document: &str, page: &str) -> String {
    let stem = Path::new(source_document)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_document);
    format!("{}_page_{}.csv", stem, page)
}

/// Capture time in Mexico City, second precision. The zone has been a
/// fixed UTC-6 since DST was abolished in 2022.
pub fn capture_timestamp() -> String {
    let offset = FixedOffset::west_opt(6 * 3600).unwrap();
    Utc::now()
        .with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S%:z")
        .to_string()
}

/// Repeated source metadata stamped onto every row of one extraction.
pub(crate) struct RowContext {
    pub source_file: String,
    pub source_url: String,
    pub page: String,
    pub capture_timestamp: String,
}

/// One row per (chunk, grounding) pair; a chunk with no groundings still
/// yields exactly one row.
pub(crate) fn flatten_chunks(chunks: &[ExtractedChunk], context: &RowContext) -> Vec<ChunkRecord> {
    let mut records = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let copies = chunk.grounding.len().max(1);
        for _ in 0..copies {
            records.push(chunk_record(chunk, index as u32 + 1, context));
        }
    }
    records
}

fn chunk_record(chunk: &ExtractedChunk, sequence: u32, context: &RowContext) -> ChunkRecord {
    ChunkRecord {
        chunk_id: chunk.chunk_id.clone(),
        chunk_sequence: sequence,
        chunk_type: chunk.chunk_type.clone(),
        raw_content: chunk.text.clone(),
        source_file: context.source_file.clone(),
        source_url: context.source_url.clone(),
        page: context.page.clone(),
        active: ACTIVE_FLAG.to_string(),
        capture_timestamp: context.capture_timestamp.clone(),
        capture_subject: CAPTURE_SUBJECT.to_string(),
        normalized_text: normalized_text(&chunk.chunk_type, &chunk.text),
    }
}

/// Table chunks normalize to their parsed row-tuple representation;
/// every other chunk type falls back to the raw content.
fn normalized_text(chunk_type: &str, raw_content: &str) -> String {
    if chunk_type.eq_ignore_ascii_case("table") {
        format_row_tuples(&html_table_rows(raw_content))
    } else {
        raw_content.to_string()
    }
}

/// Parse the first `<table>` in `html` into trimmed cell tuples, header
/// and data rows alike. No table yields no rows.
pub(crate) fn html_table_rows(html: &str) -> Vec<Vec<String>> {
    let document = Html::parse_document(html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let Some(table) = document.select(&table_selector).next() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for row in table.select(&row_selector) {
        rows.push(
            row.select(&cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect(),
        );
    }
    rows
}

/// Textual list-of-tuples representation: `[("Qty", "Desc"), ("1", "Bolt")]`.
pub(crate) fn format_row_tuples(rows: &[Vec<String>]) -> String {
    let mut out = String::from("[");
    for (row_index, row) in rows.iter().enumerate() {
        if row_index > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for (cell_index, cell) in row.iter().enumerate() {
            if cell_index > 0 {
                out.push_str(", ");
            }
            out.push_str(&format!("{:?}", cell));
        }
        out.push(')');
    }
    out.push(']');
    out
}

/// Write the chunk records as a new CSV artifact. A parser that returned
/// no chunks still produces a header-only table.
fn write_records(records: &[ChunkRecord], path: &Path) -> Result<()> {
    let file = create_artifact(path)?;
    let mut writer = csv::Writer::from_writer(file);
    if records.is_empty() {
        writer.write_record(ChunkRecord::COLUMNS)?;
    } else {
        for record in records {
            writer.serialize(record)?;
        }
    }
    writer.flush()?;
    Ok(())
}
