//! RAG Server binary
//!
//! Run with: cargo run -p agent-rag --bin agent-rag-server

use agent_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing or invalid settings abort startup
    let config = RagConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Storage: {:?} (bucket {})", config.storage.backend, config.storage.bucket);
    tracing::info!("  - Chat model: {}", config.gemini.chat_model);
    tracing::info!("  - Embedding model: {}", config.gemini.embedding_model);
    tracing::info!(
        "  - Vector collection: {} in {}",
        config.vector_db.collection_name,
        config.vector_db.persist_directory.display()
    );
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  UI: http://{}/", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload - Upload a PDF (multipart field 'file')");
    println!("  POST /query  - Ask a question ({{\"query\": \"...\"}})");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
