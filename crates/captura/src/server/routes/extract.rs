//! Extractor endpoint

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::Result;
use crate::pipeline::extractor;
use crate::server::routes::FilenameQuery;
use crate::server::state::AppState;

/// GET /extract?filename=<document_page_N.pdf>
pub async fn extract_page(
    State(state): State<AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<Value>> {
    let filename = query.require()?;
    tracing::info!("extract requested for '{}'", filename);

    let outcome = extractor::extract_page(
        state.store(),
        state.extraction(),
        &state.config().storage.public_base_url,
        filename,
    )
    .await?;

    Ok(Json(json!({
        "message": "extraction completed",
        "filename": filename,
        "source_document": outcome.source_document,
        "page": outcome.page,
        "rows": outcome.rows,
        "chunk_table": outcome.table_name,
    })))
}
