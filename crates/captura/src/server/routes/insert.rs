//! Loader endpoint

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::Result;
use crate::pipeline::loader;
use crate::server::routes::FilenameQuery;
use crate::server::state::AppState;

/// GET /insert?filename=<document_page_N_generated.csv>
pub async fn insert_rows(
    State(state): State<AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<Value>> {
    let filename = query.require()?;
    tracing::info!("insert requested for '{}'", filename);

    let outcome = loader::load_table(state.store(), &state.config().database, filename).await?;

    Ok(Json(json!({
        "message": "insert completed",
        "filename": filename,
        "source_document": outcome.source_document,
        "table": outcome.destination_table,
        "rows_inserted": outcome.rows_inserted,
    })))
}
