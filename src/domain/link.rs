use crate::domain::session::Currency;
use crate::domain::signature;
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use url::Url;

/// Builds signed payment-initiation URLs for the gateway.
///
/// Holds the read-only merchant credentials; safe to clone and share across
/// tasks. The query layout (`public_key`, `account`, `sum`, `desc`,
/// `currency`, `sign`, `result_url`) mirrors what the gateway expects.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    public_key: String,
    secret: String,
    gateway_url: Url,
    result_url: Url,
}

impl LinkBuilder {
    pub fn new(
        public_key: String,
        secret: String,
        gateway_url: Url,
        result_url: Url,
    ) -> Result<Self> {
        if public_key.is_empty() {
            return Err(Error::Config("merchant public key is not set".to_string()));
        }
        if secret.is_empty() {
            return Err(Error::Config("merchant secret key is not set".to_string()));
        }
        Ok(Self {
            public_key,
            secret,
            gateway_url,
            result_url,
        })
    }

    /// Composes the payment link for one payer and amount.
    ///
    /// The amount is formatted with exactly two fractional digits before
    /// signing, independent of how the payer typed it. Non-positive amounts
    /// are rejected before any signature work.
    pub fn build(&self, payer_id: &str, amount: Decimal, currency: Currency) -> Result<Url> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation(format!(
                "amount must be positive, got {amount}"
            )));
        }

        let sum = format!("{:.2}", amount.round_dp(2));
        let desc = format!("TopUp_{payer_id}");
        let sign = signature::creation_signature(&desc, payer_id, &sum, &self.secret)?;

        let mut url = self.gateway_url.clone();
        url.query_pairs_mut()
            .append_pair("public_key", &self.public_key)
            .append_pair("account", payer_id)
            .append_pair("sum", &sum)
            .append_pair("desc", &desc)
            .append_pair("currency", currency.code())
            .append_pair("sign", &sign)
            .append_pair("result_url", self.result_url.as_str());
        Ok(url)
    }
}
