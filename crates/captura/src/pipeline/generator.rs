//! Table Generator stage: chunk tables into balanced, enriched invoice tables
//!
//! The shaping contract: whatever the model returns, the persisted table is
//! row-aligned to the `item_id` array and carries the source metadata on
//! every row.

use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::InvoiceModel;
use crate::storage::{DataTable, StageStore};
use crate::types::InvoiceTable;

use super::json_recovery::recover_json;
use super::require_csv;

/// Metadata columns broadcast from the chunk table onto every generated row.
pub const ENRICHMENT_COLUMNS: [&str; 6] = [
    "source_file",
    "source_url",
    "page",
    "active",
    "capture_timestamp",
    "capture_subject",
];

/// Outcome of a successful generation.
#[derive(Debug)]
pub struct GenerateOutcome {
    /// Rows in the generated table
    pub rows: usize,
    /// Name of the generated-table artifact
    pub table_name: String,
}

/// Generate the invoice table for `filename` (a chunk table in the chunks
/// area), persist it in the tables area, then remove the consumed input.
pub async fn generate_table(
    store: &StageStore,
    model: &dyn InvoiceModel,
    filename: &str,
) -> Result<GenerateOutcome> {
    let path = StageStore::resolve(store.chunks(), filename)?;
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "no such chunk table in results: {}",
            filename
        )));
    }
    require_csv(filename)?;

    let chunk_table = DataTable::read_csv(&path)?;
    if !chunk_table.has_column("normalized_text") {
        return Err(Error::Validation(
            "chunk table is missing the \"normalized_text\" column".to_string(),
        ));
    }

    let payload = concatenated_text(&chunk_table);
    tracing::info!(
        "generating table for '{}' with {} ({} chars of input)",
        filename,
        model.model(),
        payload.len()
    );

    let response = model.generate_invoice_json(&payload).await?;
    let value = recover_json(&response).ok_or_else(|| {
        Error::ExtractionFailure("no JSON object recoverable from model response".to_string())
    })?;

    let invoice = InvoiceTable::from_json(&value)?;
    let mut generated = invoice.balanced().to_table();
    enrich(&chunk_table, &mut generated);

    let table_name = generated_table_name(filename);
    generated.write_csv_new(&store.tables().join(&table_name))?;
    StageStore::remove_consumed(&path)?;

    tracing::info!(
        "generated '{}': {} rows",
        table_name,
        generated.row_count()
    );

    Ok(GenerateOutcome {
        rows: generated.row_count(),
        table_name,
    })
}

/// All normalized-text cells, space-joined in row order.
fn concatenated_text(table: &DataTable) -> String {
    table.column_values("normalized_text").join(" ")
}

/// Broadcast the first non-null value of each metadata column from the
/// chunk table onto every generated row, overwriting anything the model
/// produced under those names.
pub(crate) fn enrich(source: &DataTable, generated: &mut DataTable) {
    for column in ENRICHMENT_COLUMNS {
        let value = source.first_non_null(column).unwrap_or("").to_string();
        generated.set_constant_column(column, &value);
    }
}

/// `{stem}_generated.csv` for a chunk-table filename.
pub fn generated_table_name(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    format!("{}_generated.csv", stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::types::invoice::INVOICE_FIELDS;
    use async_trait::async_trait;

    struct FixedModel(&'static str);

    #[async_trait]
    impl InvoiceModel for FixedModel {
        async fn generate_invoice_json(&self, _page_text: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn store_in(dir: &Path) -> StageStore {
        let config = StorageConfig {
            incoming_dir: dir.join("files"),
            pages_dir: dir.join("pages"),
            chunks_dir: dir.join("results"),
            tables_dir: dir.join("tables"),
            archive_dir: dir.join("archive"),
            public_base_url: "https://files.test".to_string(),
        };
        StageStore::new(&config).unwrap()
    }

    fn chunk_table() -> DataTable {
        let mut table = DataTable::new(
            [
                "chunk_id",
                "normalized_text",
                "source_file",
                "source_url",
                "page",
                "active",
                "capture_timestamp",
                "capture_subject",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        table.push_row(vec![
            "c-1".to_string(),
            "INVOICE 42".to_string(),
            "covalca_3.pdf".to_string(),
            "https://files.test/covalca_3.pdf".to_string(),
            String::new(),
            "1".to_string(),
            "2025-08-05 10:00:00-06:00".to_string(),
            "captura".to_string(),
        ]);
        table.push_row(vec![
            "c-2".to_string(),
            "item 1 bolt 5.00".to_string(),
            "covalca_3.pdf".to_string(),
            "https://files.test/covalca_3.pdf".to_string(),
            "3".to_string(),
            "1".to_string(),
            "2025-08-05 10:00:00-06:00".to_string(),
            "captura".to_string(),
        ]);
        table
    }

    #[test]
    fn enrichment_broadcasts_the_first_non_null_value() {
        let source = chunk_table();
        let mut generated = DataTable::new(vec!["item_id".to_string(), "page".to_string()]);
        generated.push_row(vec!["1".to_string(), "model-said-9".to_string()]);
        generated.push_row(vec!["2".to_string(), String::new()]);

        enrich(&source, &mut generated);

        // The model's own page values are overwritten by the source's first
        // non-null page, and missing metadata columns are appended
        assert!(generated
            .column_values("page")
            .iter()
            .all(|cell| *cell == "3"));
        assert!(generated
            .column_values("source_file")
            .iter()
            .all(|cell| *cell == "covalca_3.pdf"));
        assert!(generated
            .column_values("capture_subject")
            .iter()
            .all(|cell| *cell == "captura"));
    }

    #[test]
    fn generated_table_names_append_the_suffix() {
        assert_eq!(
            generated_table_name("covalca_3_page_16.csv"),
            "covalca_3_page_16_generated.csv"
        );
    }

    #[tokio::test]
    async fn generate_produces_a_balanced_enriched_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        chunk_table()
            .write_csv_new(&store.chunks().join("covalca_3_page_3.csv"))
            .unwrap();

        let model = FixedModel(
            "```json\n{\"item_id\": [\"1\", \"2\", \"3\"], \"description\": [\"bolt\"], \
             \"quantity\": [\"1\", \"2\", \"3\", \"4\"]}\n```",
        );
        let outcome = generate_table(&store, &model, "covalca_3_page_3.csv")
            .await
            .unwrap();

        assert_eq!(outcome.rows, 3);
        assert_eq!(outcome.table_name, "covalca_3_page_3_generated.csv");
        // Input removed from the pending set
        assert!(!store.chunks().join("covalca_3_page_3.csv").exists());

        let generated =
            DataTable::read_csv(&store.tables().join("covalca_3_page_3_generated.csv")).unwrap();
        assert_eq!(generated.row_count(), 3);
        assert_eq!(
            generated.columns().len(),
            INVOICE_FIELDS.len() + ENRICHMENT_COLUMNS.len()
        );
        // Constant-repeat padding
        assert!(generated
            .column_values("description")
            .iter()
            .all(|cell| *cell == "bolt"));
        // Truncation
        assert_eq!(generated.column_values("quantity"), ["1", "2", "3"]);
        // Enrichment broadcast
        assert!(generated
            .column_values("page")
            .iter()
            .all(|cell| *cell == "3"));
    }

    #[tokio::test]
    async fn generate_without_recoverable_json_is_an_extraction_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        chunk_table()
            .write_csv_new(&store.chunks().join("covalca_3_page_3.csv"))
            .unwrap();

        let model = FixedModel("I could not find any invoice data in the input.");
        let err = generate_table(&store, &model, "covalca_3_page_3.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExtractionFailure(_)));
        // A failed stage leaves its input intact
        assert!(store.chunks().join("covalca_3_page_3.csv").exists());
    }

    #[tokio::test]
    async fn generate_without_item_id_is_a_validation_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        chunk_table()
            .write_csv_new(&store.chunks().join("covalca_3_page_3.csv"))
            .unwrap();

        let model = FixedModel("{\"description\": [\"bolt\"]}");
        let err = generate_table(&store, &model, "covalca_3_page_3.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn generate_refuses_a_duplicate_invocation() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        chunk_table()
            .write_csv_new(&store.chunks().join("covalca_3_page_3.csv"))
            .unwrap();

        let model = FixedModel("{\"item_id\": [\"1\"]}");
        generate_table(&store, &model, "covalca_3_page_3.csv")
            .await
            .unwrap();

        // Same chunk table reappears; its generated output already exists
        chunk_table()
            .write_csv_new(&store.chunks().join("covalca_3_page_3.csv"))
            .unwrap();
        let err = generate_table(&store, &model, "covalca_3_page_3.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn generate_validates_extension_and_presence() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let model = FixedModel("{}");

        let err = generate_table(&store, &model, "missing.csv").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        std::fs::write(store.chunks().join("table.xlsx"), "x").unwrap();
        let err = generate_table(&store, &model, "table.xlsx").await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }
}
