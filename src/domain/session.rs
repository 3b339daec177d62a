use crate::error::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::str::FromStr;

/// Upper bound on a single top-up, regardless of currency.
pub const MAX_AMOUNT: Decimal = dec!(100000);

/// Currencies the gateway accepts for top-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Uah,
    Eur,
}

impl Currency {
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Uah => "UAH",
            Currency::Eur => "EUR",
        }
    }

    /// Smallest top-up the gateway accepts in this currency.
    pub fn minimum(&self) -> Decimal {
        match self {
            Currency::Uah => dec!(25),
            Currency::Eur => dec!(1),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UAH" => Ok(Currency::Uah),
            "EUR" => Ok(Currency::Eur),
            other => Err(Error::Validation(format!("unknown currency: {other}"))),
        }
    }
}

/// Where a payer currently is in the top-up conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingCurrency,
    AwaitingAmount,
}

/// Per-payer transient conversation state.
///
/// Created on the start command, mutated by currency and amount input,
/// cleared once a payment link is handed out. Never shared across payers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub phase: Phase,
    pub currency: Option<Currency>,
}
