//! Gemini API providers: embeddings and the agent's chat model

mod chat;
mod client;
mod embedder;

pub use chat::GeminiChat;
pub use client::GeminiClient;
pub use embedder::GeminiEmbedder;
