//! Answer generation: tool-calling agent, retrieval tool and answer service

pub mod agent;
pub mod answer;
pub mod prompt;
pub mod retriever_tool;

pub use agent::{
    ChatModel, Message, MessagePart, ModelReply, ReasoningAgent, Role, Tool, ToolAgent, ToolCall,
    ToolSpec,
};
pub use answer::{AnswerService, ERROR_ANSWER, NO_ANSWER};
pub use retriever_tool::RetrieverTool;
