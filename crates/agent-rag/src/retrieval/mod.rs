//! Vector retrieval over document chunks

mod vector_index;

pub use vector_index::{cosine_similarity, LocalVectorIndex, VectorIndex, VectorSearchResult};
