use crate::error::{Error, Result};
use sha2::{Digest, Sha256};

/// Computes the outbound (link creation) signature.
///
/// SHA-256 over the bare concatenation `description ‖ account ‖ amount ‖ secret`,
/// rendered as lowercase hex. The field order is a fixed contract with the
/// gateway and must never change. `amount` must already be formatted with
/// exactly two fractional digits.
pub fn creation_signature(
    description: &str,
    account: &str,
    amount: &str,
    secret: &str,
) -> Result<String> {
    require_secret(secret)?;
    let mut hasher = Sha256::new();
    hasher.update(description.as_bytes());
    hasher.update(account.as_bytes());
    hasher.update(amount.as_bytes());
    hasher.update(secret.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Computes the inbound (callback) signature.
///
/// MD5 over `payment_id ‖ account ‖ amount ‖ secret`, lowercase hex. The
/// amount is used verbatim: the gateway's own formatting is not contractually
/// fixed, so the reconciler evaluates this once per candidate representation
/// instead of normalizing here.
pub fn callback_signature(
    payment_id: &str,
    account: &str,
    amount: &str,
    secret: &str,
) -> Result<String> {
    require_secret(secret)?;
    let digest = md5::compute(format!("{payment_id}{account}{amount}{secret}"));
    Ok(format!("{digest:x}"))
}

fn require_secret(secret: &str) -> Result<()> {
    if secret.is_empty() {
        return Err(Error::Config(
            "merchant secret key is not set".to_string(),
        ));
    }
    Ok(())
}
