use crate::domain::link::LinkBuilder;
use crate::domain::ports::SessionStoreBox;
use crate::domain::session::{Currency, MAX_AMOUNT, Phase, Session};
use crate::error::Result;
use rust_decimal::Decimal;
use std::str::FromStr;
use url::Url;

/// One payer input, already stripped of transport details.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    /// The start command; resets any prior session.
    Start,
    /// A currency button press.
    CurrencyChosen(Currency),
    /// Free-form text, meaningful only while an amount is awaited.
    Text(&'a str),
}

/// What to tell the payer after handling one input.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    CurrencyMenu,
    AmountPrompt {
        currency: Currency,
    },
    BelowMinimum {
        currency: Currency,
        minimum: Decimal,
    },
    AboveMaximum {
        maximum: Decimal,
    },
    NotANumber,
    PaymentLink {
        url: Url,
        amount: Decimal,
        currency: Currency,
    },
    /// Input arrived outside the phase where it means anything.
    Ignored,
}

/// Drives the payer through currency selection and amount entry.
///
/// `idle -> awaiting currency -> awaiting amount -> idle`. Validation
/// failures keep the session in the amount phase so the payer can retry;
/// a generated link clears the session.
pub struct ConversationEngine {
    sessions: SessionStoreBox,
    links: LinkBuilder,
}

impl ConversationEngine {
    pub fn new(sessions: SessionStoreBox, links: LinkBuilder) -> Self {
        Self { sessions, links }
    }

    pub async fn handle(&self, payer_id: &str, input: Input<'_>) -> Result<Reply> {
        match input {
            Input::Start => {
                let session = Session {
                    phase: Phase::AwaitingCurrency,
                    currency: None,
                };
                self.sessions.put(payer_id, session).await?;
                Ok(Reply::CurrencyMenu)
            }
            // A re-pressed button simply restarts amount entry.
            Input::CurrencyChosen(currency) => {
                let session = Session {
                    phase: Phase::AwaitingAmount,
                    currency: Some(currency),
                };
                self.sessions.put(payer_id, session).await?;
                Ok(Reply::AmountPrompt { currency })
            }
            Input::Text(text) => self.handle_amount(payer_id, text).await,
        }
    }

    async fn handle_amount(&self, payer_id: &str, text: &str) -> Result<Reply> {
        let session = self.sessions.get(payer_id).await?.unwrap_or_default();
        if session.phase != Phase::AwaitingAmount {
            return Ok(Reply::Ignored);
        }
        let currency = session.currency.unwrap_or(Currency::Uah);

        // Comma is accepted as the decimal separator.
        let normalized = text.trim().replace(',', ".");
        let Ok(amount) = Decimal::from_str(&normalized) else {
            return Ok(Reply::NotANumber);
        };
        if amount < currency.minimum() {
            return Ok(Reply::BelowMinimum {
                currency,
                minimum: currency.minimum(),
            });
        }
        if amount > MAX_AMOUNT {
            return Ok(Reply::AboveMaximum {
                maximum: MAX_AMOUNT,
            });
        }

        let url = self.links.build(payer_id, amount, currency)?;
        self.sessions.clear(payer_id).await?;
        Ok(Reply::PaymentLink {
            url,
            amount,
            currency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemorySessionStore;
    use rust_decimal_macros::dec;

    fn engine() -> ConversationEngine {
        let links = LinkBuilder::new(
            "public".to_string(),
            "topsecret".to_string(),
            Url::parse("https://api.pay4bit.net/pay").unwrap(),
            Url::parse("https://bridge.example.com/webhook").unwrap(),
        )
        .unwrap();
        ConversationEngine::new(Box::new(InMemorySessionStore::new()), links)
    }

    #[tokio::test]
    async fn test_full_flow_resets_to_idle() {
        let engine = engine();

        let reply = engine.handle("42", Input::Start).await.unwrap();
        assert_eq!(reply, Reply::CurrencyMenu);

        let reply = engine
            .handle("42", Input::CurrencyChosen(Currency::Eur))
            .await
            .unwrap();
        assert_eq!(
            reply,
            Reply::AmountPrompt {
                currency: Currency::Eur
            }
        );

        let reply = engine.handle("42", Input::Text("50")).await.unwrap();
        let Reply::PaymentLink { amount, currency, .. } = reply else {
            panic!("expected a payment link");
        };
        assert_eq!(amount, dec!(50));
        assert_eq!(currency, Currency::Eur);

        // Session cleared: further text is ignored.
        let reply = engine.handle("42", Input::Text("50")).await.unwrap();
        assert_eq!(reply, Reply::Ignored);
    }

    #[tokio::test]
    async fn test_below_minimum_keeps_session() {
        let engine = engine();
        engine.handle("42", Input::Start).await.unwrap();
        engine
            .handle("42", Input::CurrencyChosen(Currency::Eur))
            .await
            .unwrap();

        let reply = engine.handle("42", Input::Text("0.5")).await.unwrap();
        assert_eq!(
            reply,
            Reply::BelowMinimum {
                currency: Currency::Eur,
                minimum: dec!(1),
            }
        );

        // Still awaiting an amount; a valid retry succeeds.
        let reply = engine.handle("42", Input::Text("50")).await.unwrap();
        assert!(matches!(reply, Reply::PaymentLink { .. }));
    }

    #[tokio::test]
    async fn test_uah_minimum_is_25() {
        let engine = engine();
        engine
            .handle("42", Input::CurrencyChosen(Currency::Uah))
            .await
            .unwrap();

        let reply = engine.handle("42", Input::Text("24.99")).await.unwrap();
        assert_eq!(
            reply,
            Reply::BelowMinimum {
                currency: Currency::Uah,
                minimum: dec!(25),
            }
        );
    }

    #[tokio::test]
    async fn test_above_maximum_keeps_session() {
        let engine = engine();
        engine
            .handle("42", Input::CurrencyChosen(Currency::Uah))
            .await
            .unwrap();

        let reply = engine.handle("42", Input::Text("100001")).await.unwrap();
        assert_eq!(
            reply,
            Reply::AboveMaximum {
                maximum: dec!(100000)
            }
        );
        let reply = engine.handle("42", Input::Text("100")).await.unwrap();
        assert!(matches!(reply, Reply::PaymentLink { .. }));
    }

    #[tokio::test]
    async fn test_non_numeric_text_reprompts() {
        let engine = engine();
        engine
            .handle("42", Input::CurrencyChosen(Currency::Uah))
            .await
            .unwrap();

        let reply = engine.handle("42", Input::Text("fifty")).await.unwrap();
        assert_eq!(reply, Reply::NotANumber);
        let reply = engine.handle("42", Input::Text("50")).await.unwrap();
        assert!(matches!(reply, Reply::PaymentLink { .. }));
    }

    #[tokio::test]
    async fn test_comma_decimal_separator() {
        let engine = engine();
        engine
            .handle("42", Input::CurrencyChosen(Currency::Eur))
            .await
            .unwrap();

        let reply = engine.handle("42", Input::Text("12,50")).await.unwrap();
        let Reply::PaymentLink { amount, .. } = reply else {
            panic!("expected a payment link");
        };
        assert_eq!(amount, dec!(12.5));
    }

    #[tokio::test]
    async fn test_text_while_idle_is_ignored() {
        let engine = engine();
        let reply = engine.handle("42", Input::Text("50")).await.unwrap();
        assert_eq!(reply, Reply::Ignored);
    }

    #[tokio::test]
    async fn test_sessions_are_independent_per_payer() {
        let engine = engine();
        engine
            .handle("1", Input::CurrencyChosen(Currency::Eur))
            .await
            .unwrap();

        // Payer 2 never started; their text does nothing.
        let reply = engine.handle("2", Input::Text("50")).await.unwrap();
        assert_eq!(reply, Reply::Ignored);
        let reply = engine.handle("1", Input::Text("50")).await.unwrap();
        assert!(matches!(reply, Reply::PaymentLink { .. }));
    }
}
