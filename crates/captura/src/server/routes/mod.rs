//! API routes for the capture server
//!
//! Four idempotent-GET operations, one per pipeline stage, each taking a
//! single `filename` query parameter and running the stage synchronously.

pub mod extract;
pub mod generate;
pub mod insert;
pub mod split;

use axum::{routing::get, Router};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Build all pipeline routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/split", get(split::split_document))
        .route("/extract", get(extract::extract_page))
        .route("/generate", get(generate::generate_table))
        .route("/insert", get(insert::insert_rows))
}

/// The single `filename` query parameter every stage endpoint takes.
#[derive(Debug, Deserialize)]
pub struct FilenameQuery {
    #[serde(default)]
    filename: String,
}

impl FilenameQuery {
    /// The filename, or an invalid-parameter error when missing/blank.
    pub fn require(&self) -> Result<&str> {
        if self.filename.trim().is_empty() {
            return Err(Error::InvalidParameter(
                "missing required parameter \"filename\"".to_string(),
            ));
        }
        Ok(&self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_parameter_must_be_present_and_non_blank() {
        let query = FilenameQuery {
            filename: String::new(),
        };
        assert!(query.require().is_err());

        let query = FilenameQuery {
            filename: "   ".to_string(),
        };
        assert!(query.require().is_err());

        let query = FilenameQuery {
            filename: "doc.pdf".to_string(),
        };
        assert_eq!(query.require().unwrap(), "doc.pdf");
    }
}
