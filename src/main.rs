use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paybridge::application::conversation::ConversationEngine;
use paybridge::application::webhook::WebhookService;
use paybridge::config::Config;
use paybridge::domain::link::LinkBuilder;
use paybridge::infrastructure::in_memory::InMemorySessionStore;
use paybridge::interfaces::http;
use paybridge::interfaces::telegram::{self, TelegramClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::parse();
    config.validate().into_diagnostic()?;

    let client = Arc::new(TelegramClient::new(&config.bot_token).into_diagnostic()?);
    let links = LinkBuilder::new(
        config.merchant_public_key.clone(),
        config.merchant_secret_key.clone(),
        config.gateway_base_url.clone(),
        config.result_url().into_diagnostic()?,
    )
    .into_diagnostic()?;

    let engine = Arc::new(ConversationEngine::new(
        Box::new(InMemorySessionStore::new()),
        links,
    ));
    let service = Arc::new(WebhookService::new(
        config.merchant_secret_key.clone(),
        client.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .into_diagnostic()?;
    info!(port = config.port, "webhook listener bound");

    let server = async {
        axum::serve(listener, http::router(service))
            .await
            .map_err(paybridge::error::Error::Io)
    };
    let dispatcher = telegram::run_dispatcher(client, engine);

    tokio::try_join!(server, dispatcher).into_diagnostic()?;
    Ok(())
}
