//! Prompt history window
//!
//! Bounds how much of the caller's conversation is forwarded to a
//! provider: the system instruction, the most recent non-system turns
//! (oldest first), then the new user message.

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::models::{ChatMessage, ConversationContext, MessageRole};
use crate::provider::PromptMessage;
use tracing::debug;

pub const SYSTEM_PROMPT: &str = r#"You are a helpful banking assistant. Your role is to:
1. Help users with banking operations (check balance, transfers, bill payments)
2. Provide financial insights and spending analysis
3. Answer questions about loan eligibility and banking products
4. Generate data visualizations when appropriate
5. Maintain a friendly, professional, and secure conversation

IMPORTANT RULES:
- Always verify user intent before executing transactions
- Never share sensitive information without proper context
- Suggest visualizations when discussing spending patterns or trends
- Be concise but informative
- Ask clarifying questions when needed

When responding, identify the user's intent and extract relevant entities (amounts, account types, dates, categories, etc.)."#;

#[derive(Debug, Clone)]
pub struct HistoryWindow {
    max_messages: usize,
    system_prompt: String,
}

impl HistoryWindow {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Build the provider history for `new_message`. Never mutates `context`.
    pub fn build(&self, context: &ConversationContext, new_message: &str) -> Vec<PromptMessage> {
        let mut recent: Vec<&ChatMessage> = context
            .messages
            .iter()
            .rev()
            .filter(|m| m.role != MessageRole::System)
            .take(self.max_messages)
            .collect();
        recent.reverse();

        let mut history = Vec::with_capacity(recent.len() + 2);
        history.push(PromptMessage::new(MessageRole::System, self.system_prompt.as_str()));
        history.extend(
            recent
                .into_iter()
                .map(|m| PromptMessage::new(m.role, m.content.as_str())),
        );
        history.push(PromptMessage::new(MessageRole::User, new_message));

        debug!(
            session_id = %context.session_id,
            forwarded = history.len() - 2,
            available = context.messages.len(),
            "Built prompt history"
        );

        history
    }
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
