//! Investor records held by the treasury ledger

use crate::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of an investor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvestorId(pub String);

impl InvestorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for InvestorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InvestorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InvestorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A single investor position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    pub id: InvestorId,
    /// Display label
    pub name: String,
    /// Ownership units, weighed against the ledger's total share denominator
    pub shares: u64,
    /// Withdrawable / investable funds; never negative
    pub balance: Amount,
    /// Lifetime dividend income; never decreases
    #[serde(default)]
    pub total_dividends: Amount,
}

impl Investor {
    /// Create a fresh investor with no dividend history.
    pub fn new(
        id: impl Into<InvestorId>,
        name: impl Into<String>,
        shares: u64,
        balance: Amount,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shares,
            balance,
            total_dividends: Amount::ZERO,
        }
    }

    /// Credit a dividend: both the balance and the lifetime income grow.
    pub fn credit_dividend(&mut self, amount: Amount) {
        self.balance += amount;
        self.total_dividends += amount;
    }

    /// Whether `amount` can be debited without going negative.
    pub fn can_cover(&self, amount: Amount) -> bool {
        self.balance >= amount
    }
}
