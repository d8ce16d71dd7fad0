//! Query request types

use serde::{Deserialize, Serialize};

/// Body of `POST /query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Natural-language question
    pub query: String,
}

impl QueryRequest {
    /// Whether the query carries no text at all
    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}
