//! Conversational turn handling
//!
//! Each user message is answered with the session's budget summary and
//! recent history as context. The model's reply is flattened to plain
//! text before it is stored or returned.

use crate::config::AgentConfig;
use crate::error::BudgetError;
use crate::llm::{ChatModel, ChatTurn};
use crate::memory::ConversationMessage;
use crate::models::BudgetState;
use crate::response::extract_text;
use crate::state::BudgetStateStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const FALLBACK_REPLY: &str = "Sorry, no response.";

/// Upper bound on messages kept per session
const MAX_STORED_MESSAGES: usize = 200;

const SYSTEM_PROMPT: &str = r#"You are Finley, a friendly personal budgeting assistant.

Guidelines:
- Help the user list their income, expenses, debts and savings goals
- Ask for one missing figure at a time, including how often it recurs
- Work in monthly amounts and show your arithmetic
- Be encouraging and concise
- Do not give investment or legal advice"#;

/// Reply to a single user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub session_id: Uuid,
    pub reply: String,
    pub source: String,
    /// Prior messages sent as context
    pub context_messages: usize,
}

pub struct BudgetAssistant {
    model: Arc<dyn ChatModel>,
    store: Arc<dyn BudgetStateStore>,
    history_window: usize,
}

impl BudgetAssistant {
    pub fn new(
        model: Arc<dyn ChatModel>,
        store: Arc<dyn BudgetStateStore>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            model,
            store,
            history_window: config.history_window,
        }
    }

    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    pub fn store(&self) -> &Arc<dyn BudgetStateStore> {
        &self.store
    }

    /// Seed a session that has no messages yet with client-side history
    pub async fn seed_history(
        &self,
        session_id: Uuid,
        prior: Vec<ConversationMessage>,
    ) -> crate::Result<bool> {
        if prior.is_empty() {
            return Ok(false);
        }

        let mut seeded = false;
        self.store
            .update(
                session_id,
                Box::new(|state: &mut BudgetState| {
                    if state.messages.message_count() > 0 {
                        return;
                    }
                    for message in prior {
                        state.messages.add_message(message);
                    }
                    seeded = true;
                }),
            )
            .await?;
        Ok(seeded)
    }

    /// Answer one user message within a session
    pub async fn handle_message(
        &self,
        session_id: Uuid,
        text: &str,
    ) -> crate::Result<AssistantReply> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BudgetError::InvalidInput("message is empty".to_string()));
        }

        // the user turn is stored before the model call, so it survives a failure
        let user_message = ConversationMessage::user(text);
        let state = self
            .store
            .update(
                session_id,
                Box::new(move |state: &mut BudgetState| {
                    state.messages.add_message(user_message)
                }),
            )
            .await?;

        let turns = build_turns(&state, self.history_window);
        let context_messages = turns.len().saturating_sub(2);

        let response = match self.model.complete(&turns).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session_id = %session_id, "Model call failed: {}", e);
                return Err(e);
            }
        };

        let mut reply = extract_text(&response).trim().to_string();
        if reply.is_empty() {
            warn!(session_id = %session_id, "Model returned no text");
            reply = FALLBACK_REPLY.to_string();
        }

        // append onto the current state; entries may have landed during the model call
        let agent_message = ConversationMessage::agent(reply.clone());
        self.store
            .update(
                session_id,
                Box::new(move |state: &mut BudgetState| {
                    state.messages.add_message(agent_message);
                    state.messages.trim_to_recent(MAX_STORED_MESSAGES);
                }),
            )
            .await?;

        info!(
            session_id = %session_id,
            context_messages,
            "Assistant reply ready"
        );

        Ok(AssistantReply {
            session_id,
            reply,
            source: self.model.name().to_string(),
            context_messages,
        })
    }
}

/// System prompt with the budget summary, then the recent conversation
fn build_turns(state: &BudgetState, history_window: usize) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history_window + 1);
    turns.push(ChatTurn::system(format!(
        "{}\n\nCurrent budget (monthly):\n{}",
        SYSTEM_PROMPT,
        state.summary()
    )));
    turns.extend(state.messages.recent(history_window.max(1)).map(ChatTurn::from));
    turns
}
