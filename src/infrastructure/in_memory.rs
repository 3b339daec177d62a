use crate::domain::ports::SessionStore;
use crate::domain::session::Session;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for conversation sessions.
///
/// Uses `Arc<RwLock<HashMap<String, Session>>>` for shared concurrent access.
/// Sessions are transient by design; nothing survives a restart.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemorySessionStore {
    /// Creates a new, empty session store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, payer_id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(payer_id).cloned())
    }

    async fn put(&self, payer_id: &str, session: Session) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(payer_id.to_string(), session);
        Ok(())
    }

    async fn clear(&self, payer_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(payer_id);
        Ok(())
    }
}
