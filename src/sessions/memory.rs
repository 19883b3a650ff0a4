use tracing::{debug, warn};

use crate::providers::ChatProviderHandle;

/// One committed question/answer exchange.
#[derive(Debug, Clone)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Running, summarized record of a session's prior turns.
///
/// Turns are folded into `summary` with one LLM call per commit. A failed
/// fold keeps the turn verbatim in the pending buffer and retries on the
/// next commit, so history is never silently dropped. Owned exclusively
/// by one session and mutated under its lock.
#[derive(Default)]
pub struct ConversationMemory {
    summary: String,
    pending: Vec<Turn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.pending.is_empty()
    }

    /// Render the history for prompt construction: the rolling summary
    /// followed by any turns not yet folded in.
    pub fn history(&self) -> String {
        let mut out = self.summary.clone();
        for turn in &self.pending {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("Human: {}\nAI: {}", turn.question, turn.answer));
        }
        out
    }

    /// Append a completed turn and fold the pending buffer into the
    /// summary. Summarization failure is internal maintenance: it is
    /// logged and retried on the next commit, never surfaced to the ask.
    pub async fn commit_turn(&mut self, chat: &ChatProviderHandle, question: &str, answer: &str) {
        self.pending.push(Turn {
            question: question.to_string(),
            answer: answer.to_string(),
        });

        let new_lines = self
            .pending
            .iter()
            .map(|t| format!("Human: {}\nAI: {}", t.question, t.answer))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Progressively summarize the conversation below, adding onto the \
             previous summary and returning a new summary.\n\n\
             Current summary:\n{}\n\n\
             New lines of conversation:\n{}\n\n\
             New summary:",
            if self.summary.is_empty() {
                "(none)"
            } else {
                &self.summary
            },
            new_lines
        );

        match chat.complete(&prompt).await {
            Ok(summary) => {
                self.summary = summary.trim().to_string();
                self.pending.clear();
                debug!(pending = 0, "conversation summary updated");
            }
            Err(e) => {
                warn!(
                    pending = self.pending.len(),
                    "summarization failed, keeping raw turns: {e}"
                );
            }
        }
    }
}
