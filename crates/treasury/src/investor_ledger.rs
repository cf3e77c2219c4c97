//! Investor ledger
//!
//! Owns the investor records and the fixed total-share denominator.
//!
//! ## Locking
//! One ledger-wide `RwLock` guards every record. Pool distribution, dividend
//! credit and reinvestment debit each hold the write lock for their whole
//! duration, so a concurrent debit never observes a half-distributed pool and
//! a check-then-debit can never interleave with another writer. Reads take
//! the read lock and hand back owned copies.
//!
//! ## Invariant
//! `sum(shares) <= total_shares`, with `total_shares > 0`. It is checked when
//! the ledger is built; no operation changes shares afterwards.

use crate::errors::{Result, TreasuryError};
use bazaar_types::{Amount, Investor, InvestorId, LedgerSnapshot, LedgerStats};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    /// Insertion order
    pub(crate) investors: Vec<Investor>,
    index: HashMap<InvestorId, usize>,
}

impl LedgerState {
    pub(crate) fn get(&self, id: &InvestorId) -> Option<&Investor> {
        self.index.get(id).map(|&pos| &self.investors[pos])
    }

    pub(crate) fn get_mut(&mut self, id: &InvestorId) -> Option<&mut Investor> {
        match self.index.get(id) {
            Some(&pos) => self.investors.get_mut(pos),
            None => None,
        }
    }
}

#[derive(Debug)]
pub struct InvestorLedger {
    total_shares: u64,
    pub(crate) state: RwLock<LedgerState>,
}

impl InvestorLedger {
    /// Build a ledger from seed records.
    ///
    /// Rejects a zero denominator, duplicate ids, negative balances or
    /// dividend totals, and seeds whose shares add up to more than
    /// `total_shares`.
    pub fn new(total_shares: u64, investors: Vec<Investor>) -> Result<Self> {
        if total_shares == 0 {
            return Err(TreasuryError::Validation(
                "total shares must be greater than zero".into(),
            ));
        }

        let mut allocated: u64 = 0;
        let mut index = HashMap::with_capacity(investors.len());
        for (pos, investor) in investors.iter().enumerate() {
            if index.insert(investor.id.clone(), pos).is_some() {
                return Err(TreasuryError::Validation(format!(
                    "duplicate investor id {}",
                    investor.id
                )));
            }
            if investor.balance.is_sign_negative() && !investor.balance.is_zero() {
                return Err(TreasuryError::Validation(format!(
                    "investor {} has a negative balance",
                    investor.id
                )));
            }
            if investor.total_dividends.is_sign_negative() && !investor.total_dividends.is_zero()
            {
                return Err(TreasuryError::Validation(format!(
                    "investor {} has negative lifetime dividends",
                    investor.id
                )));
            }
            allocated = allocated
                .checked_add(investor.shares)
                .ok_or(TreasuryError::CalculationOverflow("allocated shares"))?;
        }

        if allocated > total_shares {
            return Err(TreasuryError::Validation(format!(
                "allocated shares {allocated} exceed total shares {total_shares}"
            )));
        }

        info!(
            target: "treasury",
            total_shares,
            allocated_shares = allocated,
            investors = investors.len(),
            "Investor ledger loaded"
        );

        Ok(Self {
            total_shares,
            state: RwLock::new(LedgerState { investors, index }),
        })
    }

    /// Empty ledger with the given denominator.
    pub fn empty(total_shares: u64) -> Result<Self> {
        Self::new(total_shares, Vec::new())
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self> {
        Self::new(snapshot.total_shares, snapshot.investors)
    }

    /// Consistent image of the whole ledger.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(self.total_shares, self.state.read().investors.clone())
    }

    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }

    /// All investors in insertion order.
    pub fn find_all(&self) -> Vec<Investor> {
        self.state.read().investors.clone()
    }

    /// Look an investor up by id.
    pub fn find_one(&self, id: &InvestorId) -> Option<Investor> {
        self.state.read().get(id).cloned()
    }

    /// Ledger aggregates.
    ///
    /// Fails with `CalculationOverflow` when the summed balances or lifetime
    /// dividends exceed the `Decimal` range.
    pub fn get_stats(&self) -> Result<LedgerStats> {
        let state = self.state.read();

        let mut allocated_shares: u64 = 0;
        let mut total_balance = Amount::ZERO;
        let mut total_dividends = Amount::ZERO;
        for investor in &state.investors {
            allocated_shares = allocated_shares
                .checked_add(investor.shares)
                .ok_or(TreasuryError::CalculationOverflow("allocated shares"))?;
            total_balance = total_balance
                .checked_add(investor.balance)
                .ok_or(TreasuryError::CalculationOverflow("total balance"))?;
            total_dividends = total_dividends
                .checked_add(investor.total_dividends)
                .ok_or(TreasuryError::CalculationOverflow("total dividends"))?;
        }

        Ok(LedgerStats {
            total_shares: self.total_shares,
            total_investors: state.investors.len(),
            allocated_shares,
            unallocated_shares: self.total_shares.saturating_sub(allocated_shares),
            total_balance,
            total_dividends,
        })
    }
}
