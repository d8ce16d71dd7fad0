//! Answer service: runs the reasoning agent and never fails

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use super::agent::ReasoningAgent;

/// Returned when the agent fails or panics
pub const ERROR_ANSWER: &str = "An error occurred while processing your request.";

/// Returned when the agent finishes without producing text
pub const NO_ANSWER: &str = "No answer found.";

/// Answers questions about the indexed documents
pub struct AnswerService {
    agent: Arc<dyn ReasoningAgent>,
}

impl AnswerService {
    pub fn new(agent: Arc<dyn ReasoningAgent>) -> Self {
        Self { agent }
    }

    /// Answer `query`; failures degrade to a fixed apology string
    pub async fn answer(&self, query: &str) -> String {
        let start = Instant::now();
        let outcome = AssertUnwindSafe(self.agent.run(query)).catch_unwind().await;

        match outcome {
            Ok(Ok(Some(answer))) => {
                tracing::info!(
                    "Answered query in {:.1}s ({} chars)",
                    start.elapsed().as_secs_f64(),
                    answer.len()
                );
                answer
            }
            Ok(Ok(None)) => {
                tracing::warn!("Agent finished without an answer");
                NO_ANSWER.to_string()
            }
            Ok(Err(e)) => {
                tracing::error!(kind = e.kind(), "Error processing query: {}", e);
                ERROR_ANSWER.to_string()
            }
            Err(_) => {
                tracing::error!("Agent panicked while processing query");
                ERROR_ANSWER.to_string()
            }
        }
    }
}
