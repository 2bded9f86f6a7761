//! HTTP server for the capture pipeline

pub mod routes;
pub mod state;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::CapturaConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Capture pipeline HTTP server
pub struct CapturaServer {
    config: CapturaConfig,
    state: AppState,
}

impl CapturaServer {
    /// Create a new server
    pub fn new(config: CapturaConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Build the router with all routes
    fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/", get(root))
            .route("/health", get(health_check))
            .merge(routes::api_routes())
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting capture server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Root endpoint: usage hint
async fn root() -> Json<Value> {
    Json(json!({
        "message": "capture pipeline running",
        "hint": "GET /split?filename=<doc.pdf> to split a document into pages. \
                 GET /extract?filename=<doc_page_N.pdf> to extract chunks into a table. \
                 GET /generate?filename=<doc_page_N.csv> to generate the invoice table. \
                 GET /insert?filename=<doc_page_N_generated.csv> to insert rows into the database.",
        "status": "ok"
    }))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
