//! Gemini chat model with function calling (`generateContent`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use super::GeminiClient;
use crate::error::{Error, Result};
use crate::generation::{ChatModel, Message, MessagePart, ModelReply, Role, ToolCall, ToolSpec};

/// Gemini model driving the agent
pub struct GeminiChat {
    client: Arc<GeminiClient>,
    model: String,
    temperature: f32,
}

impl GeminiChat {
    /// Create a chat model (e.g. "gemini-2.0-flash")
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("models/{}:generateContent", model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: WireContent,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTools<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTools<'a> {
    function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Serialize)]
struct FunctionDeclaration<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: WireContent,
    finish_reason: Option<String>,
}

impl From<&MessagePart> for WirePart {
    fn from(part: &MessagePart) -> Self {
        match part {
            MessagePart::Text(text) => WirePart {
                text: Some(text.clone()),
                ..Default::default()
            },
            MessagePart::ToolCall(call) => WirePart {
                function_call: Some(FunctionCall {
                    name: call.name.clone(),
                    args: call.args.clone(),
                }),
                ..Default::default()
            },
            MessagePart::ToolResult { name, content } => WirePart {
                function_response: Some(FunctionResponse {
                    name: name.clone(),
                    response: json!({ "name": name, "content": content }),
                }),
                ..Default::default()
            },
        }
    }
}

impl From<&Message> for WireContent {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Model => "model",
        };
        WireContent {
            role: Some(role.to_string()),
            parts: message.parts.iter().map(WirePart::from).collect(),
        }
    }
}

fn into_reply(content: WireContent) -> ModelReply {
    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for part in content.parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            tool_calls.push(ToolCall {
                name: call.name,
                args: call.args,
            });
        }
    }

    ModelReply {
        text: (!text.trim().is_empty()).then_some(text),
        tool_calls,
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn complete(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelReply> {
        let declarations: Vec<FunctionDeclaration<'_>> = tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: &t.name,
                description: &t.description,
                parameters: &t.parameters,
            })
            .collect();

        let request = GenerateRequest {
            system_instruction: WireContent {
                role: None,
                parts: vec![WirePart {
                    text: Some(system.to_string()),
                    ..Default::default()
                }],
            },
            contents: messages.iter().map(WireContent::from).collect(),
            tools: if declarations.is_empty() {
                Vec::new()
            } else {
                vec![WireTools {
                    function_declarations: declarations,
                }]
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let response: GenerateResponse = self.client.post_json(&self.endpoint(), &request).await?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            let feedback = response
                .prompt_feedback
                .map(|f| f.to_string())
                .unwrap_or_else(|| "none".to_string());
            return Err(Error::llm(format!(
                "Gemini returned no candidates (prompt feedback: {})",
                feedback
            )));
        };

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if reason != "STOP" {
                tracing::debug!(finish_reason = reason, "Gemini candidate finished early");
            }
        }

        Ok(into_reply(candidate.content))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
