use super::session::Session;
use crate::error::Result;
use async_trait::async_trait;

/// Storage for per-payer conversation sessions.
///
/// In-memory by default; the conversation engine only sees this trait, so a
/// persistent backend can be swapped in without touching the state machine.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, payer_id: &str) -> Result<Option<Session>>;
    async fn put(&self, payer_id: &str, session: Session) -> Result<()>;
    async fn clear(&self, payer_id: &str) -> Result<()>;
}

pub type SessionStoreBox = Box<dyn SessionStore>;

/// Outbound half of the messaging transport: deliver one message to a payer.
#[async_trait]
pub trait PayerNotifier: Send + Sync {
    async fn notify(&self, payer_id: &str, text: &str) -> Result<()>;
}
