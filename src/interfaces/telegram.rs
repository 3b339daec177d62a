use crate::application::conversation::{ConversationEngine, Input, Reply};
use crate::domain::ports::PayerNotifier;
use crate::domain::session::Currency;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const POLL_TIMEOUT_SECS: u64 = 25;
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Thin Telegram Bot API client over reqwest.
///
/// Only the handful of methods the bridge needs: long-poll updates, send a
/// message, acknowledge a button press.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    fn callback(text: &str, data: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: Some(data.to_string()),
            url: None,
        }
    }

    fn link(text: String, url: String) -> Self {
        Self {
            text,
            callback_data: None,
            url: Some(url),
        }
    }
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
}

#[derive(Serialize)]
struct AnswerCallbackQuery<'a> {
    callback_query_id: &'a str,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::Config("bot token is not set".to_string()));
        }
        let http = reqwest::Client::builder()
            // Must outlive the long-poll window.
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 10))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("https://api.telegram.org/bot{token}"),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
    ) -> Result<T> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(payload)
            .send()
            .await?;
        let api: ApiResponse<T> = response.json().await?;
        if !api.ok {
            return Err(Error::Delivery(format!(
                "{method} failed: {}",
                api.description.unwrap_or_default()
            )));
        }
        api.result
            .ok_or_else(|| Error::Delivery(format!("{method} returned no result")))
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: POLL_TIMEOUT_SECS,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id,
                    text,
                    parse_mode: "HTML",
                    reply_markup,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery { callback_query_id },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl PayerNotifier for TelegramClient {
    async fn notify(&self, payer_id: &str, text: &str) -> Result<()> {
        self.send_message(payer_id, text, None).await
    }
}

/// Long-poll loop feeding chat updates into the conversation engine.
///
/// Updates are consumed sequentially, which keeps same-payer inputs in
/// arrival order. Poll failures are logged and retried after a short delay;
/// a failure to handle one update never stops the loop.
pub async fn run_dispatcher(
    client: Arc<TelegramClient>,
    engine: Arc<ConversationEngine>,
) -> Result<()> {
    info!("bot dispatcher started");
    let mut offset = 0i64;
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "update poll failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };
        for update in updates {
            offset = offset.max(update.update_id + 1);
            if let Err(e) = dispatch(&client, &engine, update).await {
                error!(error = %e, "failed to handle update");
            }
        }
    }
}

async fn dispatch(
    client: &TelegramClient,
    engine: &ConversationEngine,
    update: Update,
) -> Result<()> {
    if let Some(callback) = update.callback_query {
        client.answer_callback_query(&callback.id).await?;
        let Some(currency) = callback.data.as_deref().and_then(parse_currency_callback) else {
            return Ok(());
        };
        let payer_id = callback.from.id.to_string();
        let reply = engine
            .handle(&payer_id, Input::CurrencyChosen(currency))
            .await?;
        return deliver(client, &payer_id, reply).await;
    }
    if let Some(message) = update.message {
        let Some(text) = message.text else {
            return Ok(());
        };
        let payer_id = message.chat.id.to_string();
        let text = text.trim();
        let input = if text == "/start" {
            Input::Start
        } else {
            Input::Text(text)
        };
        let reply = engine.handle(&payer_id, input).await?;
        return deliver(client, &payer_id, reply).await;
    }
    Ok(())
}

fn parse_currency_callback(data: &str) -> Option<Currency> {
    data.strip_prefix("curr_")?.parse().ok()
}

async fn deliver(client: &TelegramClient, payer_id: &str, reply: Reply) -> Result<()> {
    match reply {
        Reply::CurrencyMenu => {
            client
                .send_message(
                    payer_id,
                    "Choose a top-up currency:",
                    Some(&currency_menu()),
                )
                .await
        }
        Reply::AmountPrompt { currency } => {
            let text = format!(
                "Selected: <b>{currency}</b>.\nEnter the top-up amount (minimum {}):",
                currency.minimum()
            );
            client.send_message(payer_id, &text, None).await
        }
        Reply::BelowMinimum { currency, minimum } => {
            let text = format!(
                "⚠️ The minimum for {currency} is <b>{minimum}</b>. Enter the amount again:"
            );
            client.send_message(payer_id, &text, None).await
        }
        Reply::AboveMaximum { maximum } => {
            let text =
                format!("The amount is too large (maximum {maximum}). Enter the amount again:");
            client.send_message(payer_id, &text, None).await
        }
        Reply::NotANumber => {
            client
                .send_message(
                    payer_id,
                    "❌ That is not a number. Enter the amount in digits (for example: 50):",
                    None,
                )
                .await
        }
        Reply::PaymentLink {
            url,
            amount,
            currency,
        } => {
            let keyboard = InlineKeyboardMarkup {
                inline_keyboard: vec![vec![InlineKeyboardButton::link(
                    format!("💳 Pay {amount} {currency}"),
                    url.to_string(),
                )]],
            };
            let text = format!(
                "Payment amount: <b>{amount} {currency}</b>\nUse the button below to proceed."
            );
            client.send_message(payer_id, &text, Some(&keyboard)).await
        }
        Reply::Ignored => Ok(()),
    }
}

fn currency_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![
            InlineKeyboardButton::callback("🇺🇦 UAH", "curr_UAH"),
            InlineKeyboardButton::callback("🇪🇺 EUR", "curr_EUR"),
        ]],
    }
}
