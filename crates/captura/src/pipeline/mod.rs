//! The four pipeline stages
//!
//! Splitter -> Extractor -> Table Generator -> Loader. Each stage consumes
//! the previous stage's durable artifact; cross-stage ordering is enforced
//! only by artifact presence in the storage areas.

pub mod extractor;
pub mod generator;
pub mod json_recovery;
pub mod loader;
pub mod splitter;

pub use extractor::{extract_page, ExtractOutcome};
pub use generator::{generate_table, GenerateOutcome};
pub use loader::{load_table, LoadOutcome};
pub use splitter::{split_document, SplitOutcome};

use std::path::Path;

use crate::error::{Error, Result};

/// Require a `.csv` table artifact, case-insensitively.
pub(crate) fn require_csv(filename: &str) -> Result<()> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if extension.eq_ignore_ascii_case("csv") {
        Ok(())
    } else {
        Err(Error::UnsupportedType(format!(
            "expected a .csv table artifact: {}",
            filename
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_csv_is_case_insensitive() {
        assert!(require_csv("table.csv").is_ok());
        assert!(require_csv("table.CSV").is_ok());
        assert!(require_csv("table.xlsx").is_err());
        assert!(require_csv("table").is_err());
    }
}
