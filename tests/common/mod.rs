use async_trait::async_trait;
use paybridge::application::conversation::ConversationEngine;
use paybridge::application::webhook::WebhookService;
use paybridge::domain::link::LinkBuilder;
use paybridge::domain::notification::FieldMap;
use paybridge::domain::ports::PayerNotifier;
use paybridge::domain::signature;
use paybridge::error::Result;
use paybridge::infrastructure::in_memory::InMemorySessionStore;
use std::sync::{Arc, Mutex};
use url::Url;

pub const SECRET: &str = "topsecret";

/// Fake messaging transport that records every delivered message.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayerNotifier for RecordingNotifier {
    async fn notify(&self, payer_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((payer_id.to_string(), text.to_string()));
        Ok(())
    }
}

pub fn webhook_service() -> (Arc<WebhookService>, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let service = Arc::new(WebhookService::new(SECRET.to_string(), notifier.clone()));
    (service, notifier)
}

pub fn link_builder() -> LinkBuilder {
    LinkBuilder::new(
        "public".to_string(),
        SECRET.to_string(),
        Url::parse("https://api.pay4bit.net/pay").unwrap(),
        Url::parse("https://bridge.example.com/webhook").unwrap(),
    )
    .unwrap()
}

pub fn conversation_engine() -> ConversationEngine {
    ConversationEngine::new(Box::new(InMemorySessionStore::new()), link_builder())
}

pub fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Builds a notification signed the way the gateway signs its callbacks.
pub fn signed_fields(payment_id: &str, account: &str, amount: &str) -> FieldMap {
    let sign = signature::callback_signature(payment_id, account, amount, SECRET).unwrap();
    fields(&[
        ("paymentId", payment_id),
        ("account", account),
        ("amount", amount),
        ("sign", sign.as_str()),
    ])
}
