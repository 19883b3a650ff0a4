use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::index::Retriever;
use crate::providers::ChatProviderHandle;
use crate::sessions::memory::ConversationMemory;

/// A grounded answer with its supporting passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Citation for one retrieved passage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub page: u32,
    pub source: String,
    pub snippet: String,
}

/// Answer `question` from the session's retrieval capability and memory.
///
/// Retrieval runs exactly once; the same passages feed both the prompt
/// context and the returned sources, so attribution can never diverge
/// from what the model saw. The turn is committed to memory only after
/// the chat call succeeds.
pub async fn answer(
    question: &str,
    retriever: &Retriever,
    memory: &mut ConversationMemory,
    chat: &ChatProviderHandle,
) -> Result<Answer, ServiceError> {
    let retrieved = retriever.retrieve(question).await?;

    let history = memory.history();
    let context = retrieved
        .iter()
        .map(|r| r.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = build_prompt(&history, &context, question);

    let answer_text = chat
        .complete(&prompt)
        .await
        .map_err(|e| ServiceError::Generation(format!("chat completion failed: {e}")))?;

    let sources = retrieved
        .iter()
        .map(|r| SourceRef {
            page: r.chunk.page,
            source: r.chunk.source.clone(),
            snippet: r.chunk.text.clone(),
        })
        .collect();

    memory.commit_turn(chat, question, &answer_text).await;

    Ok(Answer {
        answer: answer_text,
        sources,
    })
}

fn build_prompt(history: &str, context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant.\n\
         Use the conversation history and the provided document context to answer.\n\
         If the context is insufficient, just say you don't know.\n\n\
         Conversation History: {history}\n\
         Context: {context}\n\
         Question: {question}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_all_three_sections() {
        let prompt = build_prompt("earlier summary", "some passage", "what now?");
        assert!(prompt.contains("Conversation History: earlier summary"));
        assert!(prompt.contains("Context: some passage"));
        assert!(prompt.contains("Question: what now?"));
    }

    #[test]
    fn prompt_instructs_honesty_on_missing_context() {
        let prompt = build_prompt("", "", "q");
        assert!(prompt.contains("just say you don't know"));
    }
}
