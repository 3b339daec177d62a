use crate::domain::signature;
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::warn;

/// Raw key/value fields of an inbound gateway notification.
pub type FieldMap = BTreeMap<String, String>;

/// Accepted aliases for the payment identifier, in resolution order.
pub const PAYMENT_ID_ALIASES: &[&str] = &["paymentId", "localpayId"];
/// Accepted aliases for the paid amount, in resolution order.
pub const AMOUNT_ALIASES: &[&str] = &["amount", "sum"];

/// Payer identifier reserved for gateway test traffic.
pub const TEST_ACCOUNT: &str = "test";

const DEFAULT_CURRENCY: &str = "UAH";

/// The callback's operation discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Pre-authorization probe; acknowledge without notifying the payer.
    Check,
    /// Final confirmation; the payer should be notified.
    Pay,
    /// Unrecognized method; accepted but logged, since funds are confirmed.
    Unknown,
}

impl OperationKind {
    fn classify(method: Option<&str>) -> Self {
        match method {
            Some("check") => OperationKind::Check,
            Some("pay") | None => OperationKind::Pay,
            Some(other) => {
                warn!(method = other, "unrecognized callback method");
                OperationKind::Unknown
            }
        }
    }
}

/// A notification that passed signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPaymentEvent {
    pub payment_id: String,
    pub payer_id: String,
    /// The amount representation whose signature matched.
    pub amount: String,
    pub currency: String,
    pub kind: OperationKind,
}

/// Result of reconciling a raw notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Request carried no identifying fields at all; a liveness probe.
    Ping,
    /// Verified payment event.
    Event(CanonicalPaymentEvent),
}

/// Looks up a logical field, accepting both `key` and `params[key]`.
pub fn lookup<'a>(fields: &'a FieldMap, key: &str) -> Option<&'a str> {
    if let Some(value) = fields.get(key) {
        return Some(value.as_str());
    }
    fields.get(&format!("params[{key}]")).map(String::as_str)
}

/// Resolves the first present value among an ordered list of aliases.
pub fn lookup_alias<'a>(fields: &'a FieldMap, aliases: &[&str]) -> Option<&'a str> {
    aliases.iter().find_map(|key| lookup(fields, key))
}

/// Builds the deduplicated set of amount representations to verify against.
///
/// The gateway's formatting of the amount in its callback is not fixed: the
/// same deployment may send `10`, `10.0` or `10.00`. For each raw value we
/// try the value as received, the value forced to two decimals, and the bare
/// integer form when the value is integral. Acceptance is not widened: each
/// candidate still has to reproduce the exact signature.
pub fn amount_candidates(raws: &[&str]) -> Vec<String> {
    fn push(out: &mut Vec<String>, candidate: String) {
        if !candidate.is_empty() && !out.contains(&candidate) {
            out.push(candidate);
        }
    }

    let mut out = Vec::new();
    for raw in raws {
        push(&mut out, raw.to_string());
        if let Ok(value) = Decimal::from_str(raw) {
            push(&mut out, format!("{:.2}", value.round_dp(2)));
            if let Some(stripped) = raw.strip_suffix(".00") {
                push(&mut out, stripped.to_string());
            } else if value.fract().is_zero() {
                push(&mut out, value.trunc().to_string());
            }
        }
    }
    out
}

/// Verifies a raw notification against the shared secret.
///
/// Field extraction is alias-aware (see [`lookup`] and the alias consts).
/// A request with neither a payment id nor an account is treated as a
/// liveness probe. Otherwise the payment id, account and signature are all
/// required; the signature is then matched case-insensitively against the
/// callback digest of every amount candidate, and the first match wins.
pub fn reconcile(fields: &FieldMap, secret: &str) -> Result<Outcome> {
    let payment_id = lookup_alias(fields, PAYMENT_ID_ALIASES);
    let account = lookup(fields, "account");
    let sign = lookup(fields, "sign");

    if payment_id.is_none() && account.is_none() {
        return Ok(Outcome::Ping);
    }
    let (Some(payment_id), Some(account), Some(sign)) = (payment_id, account, sign) else {
        return Err(Error::MalformedRequest(
            "missing paymentId, account or sign",
        ));
    };

    let raws: Vec<&str> = AMOUNT_ALIASES
        .iter()
        .filter_map(|key| lookup(fields, key))
        .collect();
    let candidates = amount_candidates(&raws);

    let mut matched = None;
    for candidate in &candidates {
        let digest = signature::callback_signature(payment_id, account, candidate, secret)?;
        if digest.eq_ignore_ascii_case(sign) {
            matched = Some(candidate.clone());
            break;
        }
    }
    let Some(amount) = matched else {
        return Err(Error::SignatureMismatch {
            received: sign.to_string(),
            candidates,
        });
    };

    let kind = OperationKind::classify(lookup(fields, "method"));
    let currency = lookup(fields, "currency").unwrap_or(DEFAULT_CURRENCY);

    Ok(Outcome::Event(CanonicalPaymentEvent {
        payment_id: payment_id.to_string(),
        payer_id: account.to_string(),
        amount,
        currency: currency.to_string(),
        kind,
    }))
}
