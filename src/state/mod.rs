//! Session state storage
//!
//! Keeps one `BudgetState` per session. In-memory only; the trait is the
//! seam for anything longer-lived.

use crate::models::BudgetState;
use crate::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A change applied to a session's state while the store holds it exclusively
pub type StateMutation<'a> = Box<dyn FnOnce(&mut BudgetState) + Send + 'a>;

/// Trait for budget state storage
#[async_trait::async_trait]
pub trait BudgetStateStore: Send + Sync {
    async fn load(&self, session_id: Uuid) -> Result<Option<BudgetState>>;
    async fn save(&self, state: &BudgetState) -> Result<()>;
    async fn remove(&self, session_id: Uuid) -> Result<bool>;

    /// Apply `mutate` to the session (created if missing) as one step and
    /// return the resulting state. Concurrent updates never overwrite each other.
    async fn update<'a>(&'a self, session_id: Uuid, mutate: StateMutation<'a>) -> Result<BudgetState>;
}

/// In-memory state store
pub struct InMemoryBudgetStore {
    sessions: Arc<RwLock<HashMap<Uuid, BudgetState>>>,
}

impl InMemoryBudgetStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryBudgetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BudgetStateStore for InMemoryBudgetStore {
    async fn load(&self, session_id: Uuid) -> Result<Option<BudgetState>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&session_id).cloned())
    }

    async fn save(&self, state: &BudgetState) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(state.session_id, state.clone());
        Ok(())
    }

    async fn remove(&self, session_id: Uuid) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(&session_id).is_some())
    }

    async fn update<'a>(&'a self, session_id: Uuid, mutate: StateMutation<'a>) -> Result<BudgetState> {
        // write guard is held for the whole read-modify-write
        let mut sessions = self.sessions.write().await;
        let state = sessions
            .entry(session_id)
            .or_insert_with(|| BudgetState::new(session_id));

        mutate(state);
        Ok(state.clone())
    }
}
