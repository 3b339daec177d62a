use crate::domain::notification::{self, FieldMap, OperationKind, Outcome, TEST_ACCOUNT};
use crate::domain::ports::PayerNotifier;
use crate::error::Error;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Final disposition of one webhook request, decided by the service and
/// rendered to an HTTP response at the interface layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookReply {
    /// Notification accepted (200 "OK").
    Accepted,
    /// Liveness probe with no identifying fields (200).
    Alive,
    /// Required fields missing (400).
    BadRequest,
    /// No amount candidate reproduced the signature (403).
    SignError,
    /// Unexpected internal fault (500); the gateway never sees a crash.
    Internal,
}

/// Verifies gateway notifications and relays confirmed payments to the payer.
pub struct WebhookService {
    secret: String,
    notifier: Arc<dyn PayerNotifier>,
}

impl WebhookService {
    pub fn new(secret: String, notifier: Arc<dyn PayerNotifier>) -> Self {
        Self { secret, notifier }
    }

    /// Handles one raw notification. Never fails: every error is converted
    /// into a reply here so nothing propagates past the handler boundary.
    pub async fn handle(&self, fields: &FieldMap) -> WebhookReply {
        match self.process(fields).await {
            Ok(reply) => reply,
            Err(Error::MalformedRequest(reason)) => {
                warn!(reason, "rejecting malformed notification");
                WebhookReply::BadRequest
            }
            Err(Error::SignatureMismatch {
                received,
                candidates,
            }) => {
                error!(%received, ?candidates, "signature verification failed");
                WebhookReply::SignError
            }
            Err(e) => {
                error!(error = %e, "webhook handler fault");
                WebhookReply::Internal
            }
        }
    }

    async fn process(&self, fields: &FieldMap) -> crate::error::Result<WebhookReply> {
        let event = match notification::reconcile(fields, &self.secret)? {
            Outcome::Ping => return Ok(WebhookReply::Alive),
            Outcome::Event(event) => event,
        };
        info!(
            payment_id = %event.payment_id,
            payer = %event.payer_id,
            amount = %event.amount,
            currency = %event.currency,
            kind = ?event.kind,
            "verified gateway notification"
        );

        match event.kind {
            // Pre-authorization probe: acknowledge, nothing to relay.
            OperationKind::Check => Ok(WebhookReply::Accepted),
            // Funds are confirmed, so fail open on an unknown method.
            OperationKind::Unknown => Ok(WebhookReply::Accepted),
            OperationKind::Pay => {
                if event.payer_id.eq_ignore_ascii_case(TEST_ACCOUNT) {
                    info!("test payment confirmed");
                    return Ok(WebhookReply::Accepted);
                }
                let text = format!(
                    "✅ Balance topped up by <b>{} {}</b>",
                    event.amount, event.currency
                );
                // Best effort: the gateway already confirmed the funds, so a
                // delivery failure must not change the decided reply.
                if let Err(e) = self.notifier.notify(&event.payer_id, &text).await {
                    error!(payer = %event.payer_id, error = %e, "payer notification failed");
                }
                Ok(WebhookReply::Accepted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::PayerNotifier;
    use crate::domain::signature;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SECRET: &str = "topsecret";

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl PayerNotifier for RecordingNotifier {
        async fn notify(&self, payer_id: &str, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::Delivery("transport down".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((payer_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn service(fail: bool) -> (WebhookService, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier {
            sent: Mutex::new(Vec::new()),
            fail,
        });
        let service = WebhookService::new(SECRET.to_string(), notifier.clone());
        (service, notifier)
    }

    fn signed_fields(payment_id: &str, account: &str, amount: &str) -> FieldMap {
        let sign = signature::callback_signature(payment_id, account, amount, SECRET).unwrap();
        [
            ("paymentId", payment_id),
            ("account", account),
            ("amount", amount),
            ("sign", sign.as_str()),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[tokio::test]
    async fn test_pay_notifies_payer() {
        let (service, notifier) = service(false);
        let fields = signed_fields("p1", "42", "25.00");

        assert_eq!(service.handle(&fields).await, WebhookReply::Accepted);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "42");
        assert!(sent[0].1.contains("25.00 UAH"));
    }

    #[tokio::test]
    async fn test_check_skips_notification() {
        let (service, notifier) = service(false);
        let mut fields = signed_fields("p1", "42", "25.00");
        fields.insert("method".to_string(), "check".to_string());

        assert_eq!(service.handle(&fields).await, WebhookReply::Accepted);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_test_account_skips_notification() {
        let (service, notifier) = service(false);
        let fields = signed_fields("p1", "TEST", "25.00");

        assert_eq!(service.handle(&fields).await, WebhookReply::Accepted);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_method_accepted_without_notification() {
        let (service, notifier) = service(false);
        let mut fields = signed_fields("p1", "42", "25.00");
        fields.insert("method".to_string(), "refund".to_string());

        assert_eq!(service.handle(&fields).await, WebhookReply::Accepted);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature_rejected_without_notification() {
        let (service, notifier) = service(false);
        let mut fields = signed_fields("p1", "42", "25.00");
        fields.insert("sign".to_string(), "deadbeef".to_string());

        assert_eq!(service.handle(&fields).await, WebhookReply::SignError);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_sign_is_bad_request() {
        let (service, _) = service(false);
        let mut fields = signed_fields("p1", "42", "25.00");
        fields.remove("sign");

        assert_eq!(service.handle(&fields).await, WebhookReply::BadRequest);
    }

    #[tokio::test]
    async fn test_empty_request_is_alive_probe() {
        let (service, _) = service(false);
        assert_eq!(service.handle(&FieldMap::new()).await, WebhookReply::Alive);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_change_reply() {
        let (service, _) = service(true);
        let fields = signed_fields("p1", "42", "25.00");

        assert_eq!(service.handle(&fields).await, WebhookReply::Accepted);
    }
}
