//! Loader stage: generated tables into PostgreSQL
//!
//! Null-placeholder normalization, column renaming, and one transactional
//! multi-row insert. The consumed table leaves the pending set only after
//! the commit.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::storage::database::{CaptureDb, DESTINATION_TABLE};
use crate::storage::{DataTable, StageStore};

use super::require_csv;

static PAGE_STEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<base>.+?)_page_\d+$").unwrap());

/// Outcome of a successful load.
#[derive(Debug)]
pub struct LoadOutcome {
    /// Rows committed to the destination table
    pub rows_inserted: usize,
    /// Destination table name
    pub destination_table: String,
    /// Original document the rows trace back to
    pub source_document: String,
}

/// Insert `filename` (a generated table in the tables area) into the
/// destination table, then remove the consumed artifact.
pub async fn load_table(
    store: &StageStore,
    database: &DatabaseConfig,
    filename: &str,
) -> Result<LoadOutcome> {
    let path = StageStore::resolve(store.tables(), filename)?;
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "no such generated table in tables: {}",
            filename
        )));
    }
    require_csv(filename)?;

    let mut table = DataTable::read_csv(&path)?;
    if table.is_empty() {
        return Err(Error::Validation(
            "generated table contains no rows".to_string(),
        ));
    }

    // Literal "NULL" in text cells is a documented type hazard: numeric or
    // date destination columns will reject it
    table.replace_blank_cells("NULL");
    table.rename_column("item_id", "item");
    table.rename_column("page", "page_number");

    let mut db = CaptureDb::connect(database).await?;
    let rows_inserted = db.insert_rows(&table).await?;

    StageStore::remove_consumed(&path)?;
    tracing::info!(
        "inserted {} rows from '{}' into {}",
        rows_inserted,
        filename,
        DESTINATION_TABLE
    );

    Ok(LoadOutcome {
        rows_inserted,
        destination_table: DESTINATION_TABLE.to_string(),
        source_document: original_document_from_artifact(filename),
    })
}

/// Derive the original document name from a table-artifact filename,
/// whatever its extension. `covalca_9_page_3_generated.csv` ->
/// `covalca_9.pdf`.
pub fn original_document_from_artifact(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    let stem = stem.strip_suffix("_generated").unwrap_or(stem);
    let base = match PAGE_STEM.captures(stem) {
        Some(caps) => caps["base"].to_string(),
        None => stem.to_string(),
    };
    format!("{}.pdf", base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_trace_back_to_the_original_document() {
        assert_eq!(
            original_document_from_artifact("covalca_9_page_3_generated.csv"),
            "covalca_9.pdf"
        );
        assert_eq!(
            original_document_from_artifact("covalca_9_page_3_generated.xlsx"),
            "covalca_9.pdf"
        );
        assert_eq!(
            original_document_from_artifact("covalca_9_page_12.csv"),
            "covalca_9.pdf"
        );
        assert_eq!(original_document_from_artifact("covalca_9.csv"), "covalca_9.pdf");
    }

    #[test]
    fn persisted_rows_follow_the_destination_column_names() {
        let mut table = DataTable::new(vec![
            "item_id".to_string(),
            "page".to_string(),
            "invoice_total".to_string(),
        ]);
        table.push_row(vec!["1".to_string(), "3".to_string(), "  ".to_string()]);
        table.push_row(vec!["2".to_string(), String::new(), "0".to_string()]);

        table.replace_blank_cells("NULL");
        table.rename_column("item_id", "item");
        table.rename_column("page", "page_number");

        assert_eq!(table.columns(), ["item", "page_number", "invoice_total"]);
        assert_eq!(table.rows()[0][2], "NULL");
        assert_eq!(table.rows()[1][1], "NULL");
        assert_eq!(table.rows()[1][2], "0");
    }
}
