use crate::error::{Error, Result};
use clap::Parser;
use url::Url;

/// Path the gateway calls back on, relative to the public base URL.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Service configuration, read once at startup.
///
/// Every option doubles as an environment variable so the service can run
/// unattended on a PaaS. The merchant keys are validated eagerly: without
/// them the service cannot produce valid links, so it must not start.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Payment gateway to messaging-bot bridge", long_about = None)]
pub struct Config {
    /// Bot API credential token.
    #[arg(long, env = "BOT_TOKEN")]
    pub bot_token: String,

    /// Merchant public key embedded in outbound payment links.
    #[arg(long, env = "MERCHANT_PUBLIC_KEY")]
    pub merchant_public_key: String,

    /// Merchant shared secret used for both signature formulas.
    #[arg(long, env = "MERCHANT_SECRET_KEY")]
    pub merchant_secret_key: String,

    /// Externally reachable base URL the gateway delivers callbacks to.
    #[arg(long, env = "WEBHOOK_BASE_URL")]
    pub webhook_base_url: Url,

    /// Payment-initiation endpoint of the gateway.
    #[arg(long, env = "GATEWAY_BASE_URL", default_value = "https://api.pay4bit.net/pay")]
    pub gateway_base_url: Url,

    /// Port the webhook listener binds to.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            return Err(Error::Config("BOT_TOKEN is not set".to_string()));
        }
        if self.merchant_public_key.is_empty() {
            return Err(Error::Config("MERCHANT_PUBLIC_KEY is not set".to_string()));
        }
        if self.merchant_secret_key.is_empty() {
            return Err(Error::Config("MERCHANT_SECRET_KEY is not set".to_string()));
        }
        Ok(())
    }

    /// Absolute URL the gateway should report payment results to.
    pub fn result_url(&self) -> Result<Url> {
        self.webhook_base_url
            .join(WEBHOOK_PATH)
            .map_err(|e| Error::Config(format!("invalid webhook base URL: {e}")))
    }
}
