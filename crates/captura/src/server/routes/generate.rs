//! Table Generator endpoint

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::Result;
use crate::pipeline::generator;
use crate::server::routes::FilenameQuery;
use crate::server::state::AppState;

/// GET /generate?filename=<document_page_N.csv>
pub async fn generate_table(
    State(state): State<AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<Value>> {
    let filename = query.require()?;
    tracing::info!("generate requested for '{}'", filename);

    let outcome = generator::generate_table(state.store(), state.model(), filename).await?;

    Ok(Json(json!({
        "message": "table generation completed",
        "filename": filename,
        "rows": outcome.rows,
        "generated_table": outcome.table_name,
    })))
}
