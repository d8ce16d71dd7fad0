//! Prompt text for the question-answering agent

/// Name of the single retrieval tool
pub const RETRIEVER_TOOL_NAME: &str = "document_retriever";

/// Description shown to the model for the retrieval tool
pub const RETRIEVER_TOOL_DESCRIPTION: &str = "Searches and returns relevant information from the uploaded documents. Use this tool to answer any questions about the document content.";

/// Observation returned when a search finds nothing
pub const NO_DOCUMENTS_FOUND: &str = "No relevant documents found.";

/// System instruction for the agent
pub const AGENT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that answers questions about documents the user has uploaded.

Work step by step:
1. Decide what information you need to answer the question.
2. Call the document_retriever tool with a focused search query. You may call it more than once with different queries.
3. Read the returned passages carefully.
4. When you have enough information, reply with the final answer in plain text.

Rules:
- Base your answer on the retrieved passages. If they do not contain the answer, say that the uploaded documents do not cover it.
- Do not invent facts, figures or quotations.
- Keep the answer concise and directly address the question."#;

/// Join retrieved passages into one tool observation
pub fn format_passages<'a>(passages: impl IntoIterator<Item = &'a str>) -> String {
    let joined = passages
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    if joined.is_empty() {
        NO_DOCUMENTS_FOUND.to_string()
    } else {
        joined
    }
}
