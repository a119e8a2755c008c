//! Conversation memory for a budgeting session

pub mod store;

pub use store::{ConversationHistory, ConversationMessage, MessageRole};
