//! Splitter endpoint

use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::Result;
use crate::pipeline::splitter;
use crate::server::routes::FilenameQuery;
use crate::server::state::AppState;

/// GET /split?filename=<document.pdf>
pub async fn split_document(
    State(state): State<AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<Value>> {
    let filename = query.require()?;
    tracing::info!("split requested for '{}'", filename);

    let outcome = splitter::split_document(state.store(), filename)?;

    Ok(Json(json!({
        "message": "page split completed",
        "filename": filename,
        "pages": outcome.pages,
        "output_dir": outcome.output_dir,
    })))
}
