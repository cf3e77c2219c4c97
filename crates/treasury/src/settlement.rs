//! Per-investor settlement: project dividends and reinvestment debits

use crate::errors::{ensure_non_negative, Result, TreasuryError};
use crate::investor_ledger::InvestorLedger;
use bazaar_types::{Amount, Investor, InvestorId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Result of a reinvestment request.
///
/// Insufficient funds is an expected outcome the caller branches on, so it
/// is a variant here and not a [`TreasuryError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvestOutcome {
    Invested { remaining_balance: Amount },
    InsufficientFunds { balance: Amount, requested: Amount },
}

impl InvestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InvestOutcome::Invested { .. })
    }
}

impl InvestorLedger {
    /// Credit a project dividend straight to one investor, bypassing the
    /// share-weighted formula.
    pub fn pay_dividend(&self, id: &InvestorId, amount: Amount) -> Result<Investor> {
        ensure_non_negative("dividend amount", amount)?;

        let mut state = self.state.write();
        let investor = state
            .get_mut(id)
            .ok_or_else(|| TreasuryError::NotFound(id.clone()))?;

        let balance = investor.balance.checked_add(amount);
        let dividends = investor.total_dividends.checked_add(amount);
        let (Some(balance), Some(dividends)) = (balance, dividends) else {
            return Err(TreasuryError::CalculationOverflow("dividend credit"));
        };
        investor.balance = balance;
        investor.total_dividends = dividends;

        info!(
            target: "treasury",
            investor = %id,
            amount = %amount,
            balance = %investor.balance,
            "Dividend paid"
        );

        Ok(investor.clone())
    }

    /// Debit `amount` for reinvestment if and only if the balance covers it.
    ///
    /// The balance check and the debit happen under the same write lock.
    pub fn invest_funds(&self, id: &InvestorId, amount: Amount) -> Result<InvestOutcome> {
        ensure_non_negative("investment amount", amount)?;

        let mut state = self.state.write();
        let investor = state
            .get_mut(id)
            .ok_or_else(|| TreasuryError::NotFound(id.clone()))?;

        if !investor.can_cover(amount) {
            warn!(
                target: "treasury",
                investor = %id,
                balance = %investor.balance,
                requested = %amount,
                "Insufficient funds for investment"
            );
            return Ok(InvestOutcome::InsufficientFunds {
                balance: investor.balance,
                requested: amount,
            });
        }

        investor.balance -= amount;

        info!(
            target: "treasury",
            investor = %id,
            amount = %amount,
            remaining = %investor.balance,
            "Funds invested"
        );

        Ok(InvestOutcome::Invested {
            remaining_balance: investor.balance,
        })
    }
}
