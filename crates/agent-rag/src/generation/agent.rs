//! Tool-calling reasoning loop
//!
//! The model is called with the conversation so far and a tool palette. Each
//! reply either requests tool calls (whose observations are appended to the
//! conversation) or carries the final answer text. The loop is bounded by
//! `max_iterations` model calls.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Author of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

/// One piece of a conversation turn
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePart {
    Text(String),
    ToolCall(ToolCall),
    /// Observation produced by running a tool
    ToolResult { name: String, content: String },
}

/// A conversation turn
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// A plain user message
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![MessagePart::Text(text.into())],
        }
    }
}

/// Declaration of a tool offered to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// What the model produced for one call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    /// A final answer
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A single tool call
    pub fn tool_call(name: impl Into<String>, args: Value) -> Self {
        Self {
            text: None,
            tool_calls: vec![ToolCall {
                name: name.into(),
                args,
            }],
        }
    }

    fn to_message(&self) -> Message {
        let mut parts = Vec::with_capacity(self.tool_calls.len() + 1);
        if let Some(text) = self.text.as_ref().filter(|t| !t.trim().is_empty()) {
            parts.push(MessagePart::Text(text.clone()));
        }
        parts.extend(self.tool_calls.iter().cloned().map(MessagePart::ToolCall));
        Message {
            role: Role::Model,
            parts,
        }
    }
}

/// A chat model that supports tool calling
///
/// Implementations:
/// - `GeminiChat`: Gemini `generateContent` with function declarations
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next reply for a conversation
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelReply>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// A capability the agent may invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declaration offered to the model
    fn spec(&self) -> ToolSpec;

    /// Run the tool and return its observation
    async fn call(&self, args: &Value) -> Result<String>;
}

/// Opaque reasoning capability: query in, final text (if any) out
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    async fn run(&self, input: &str) -> Result<Option<String>>;
}

/// Bounded tool-calling agent over a `ChatModel`
pub struct ToolAgent {
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn Tool>>,
    system_prompt: String,
    max_iterations: usize,
}

impl ToolAgent {
    /// Create an agent with an empty tool palette
    pub fn new(model: Arc<dyn ChatModel>, system_prompt: impl Into<String>, max_iterations: usize) -> Self {
        Self {
            model,
            tools: Vec::new(),
            system_prompt: system_prompt.into(),
            max_iterations: max_iterations.max(1),
        }
    }

    /// Add a tool to the palette
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    async fn invoke(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.spec().name == call.name) else {
            tracing::warn!(tool = %call.name, "Model requested an unknown tool");
            let available: Vec<String> = self.tools.iter().map(|t| t.spec().name).collect();
            return format!(
                "Unknown tool '{}'. Available tools: {}",
                call.name,
                available.join(", ")
            );
        };

        match tool.call(&call.args).await {
            Ok(observation) => observation,
            Err(e) => {
                tracing::warn!(tool = %call.name, kind = e.kind(), "Tool failed: {}", e);
                format!("Tool '{}' failed: {}", call.name, e)
            }
        }
    }
}

#[async_trait]
impl ReasoningAgent for ToolAgent {
    async fn run(&self, input: &str) -> Result<Option<String>> {
        let specs: Vec<ToolSpec> = self.tools.iter().map(|t| t.spec()).collect();
        let mut messages = vec![Message::user_text(input)];

        for iteration in 1..=self.max_iterations {
            let reply = self
                .model
                .complete(&self.system_prompt, &messages, &specs)
                .await?;

            if reply.tool_calls.is_empty() {
                tracing::debug!(iterations = iteration, "Agent produced a final reply");
                return Ok(reply
                    .text
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()));
            }

            messages.push(reply.to_message());

            let mut observations = Vec::with_capacity(reply.tool_calls.len());
            for call in &reply.tool_calls {
                tracing::debug!(tool = %call.name, args = %call.args, "Agent invoking tool");
                let content = self.invoke(call).await;
                observations.push(MessagePart::ToolResult {
                    name: call.name.clone(),
                    content,
                });
            }
            messages.push(Message {
                role: Role::User,
                parts: observations,
            });
        }

        Err(Error::llm(format!(
            "Agent ({}) gave no final answer within {} iterations",
            self.model.name(),
            self.max_iterations
        )))
    }
}
