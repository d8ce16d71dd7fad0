//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - Answer a question about the uploaded documents
pub async fn query_documents(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = payload?;
    if request.is_blank() {
        return Err(Error::validation("Query cannot be empty."));
    }

    tracing::info!("Query: \"{}\"", request.query);
    let answer = state.answers().answer(&request.query).await;

    Ok(Json(QueryResponse {
        query: request.query,
        answer,
    }))
}
