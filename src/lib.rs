//! Finley budget assistant
//!
//! A small personal-budgeting assistant on top of a hosted chat model:
//! - Normalizes free-form amounts ("1.2k", "$1,200", "100-150") to floats
//! - Scales recurring amounts to monthly figures by pay frequency
//! - Flattens chat completion payloads into plain text
//! - Keeps a per-session budget state and conversation history
//!
//! FLOW:
//! MESSAGE → CONTEXT → MODEL → EXTRACT TEXT → STORE
//! ENTRY → PARSE → NORMALIZE → AGGREGATE

pub mod api;
pub mod assistant;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod memory;
pub mod models;
pub mod money;
pub mod response;
pub mod state;

pub use error::{BudgetError, Result};

// Re-export common types
pub use models::*;
pub use money::{normalize_to_monthly, parse_money, parse_money_text, Frequency, RawAmount};
pub use response::{extract_text, ChatResponse, ContentPart, ResponseContent};
