//! HTTP routes for the RAG server

pub mod query;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Upload/query page
const INDEX_HTML: &str = include_str!("../../../static/index.html");

/// Build all routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        // Upload - with larger body limit for PDF files
        .route(
            "/upload",
            post(upload::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::query_documents))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness: object store reachable and vector index usable
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let object_store = state.object_store().health_check().await.unwrap_or(false);
    let vector_index = state.index().health_check().await.unwrap_or(false);
    let chunks = state.index().len().await.unwrap_or(0);

    let status = if object_store && vector_index {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "object_store": object_store,
            "vector_index": vector_index,
            "chunks": chunks,
        })),
    )
}
