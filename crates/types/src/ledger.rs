//! Ledger-level aggregates and persisted images

use crate::{Amount, Investor, SystemSettings};
use serde::{Deserialize, Serialize};

/// Share denominator used when nothing else is configured.
pub const DEFAULT_TOTAL_SHARES: u64 = 10_000;

/// Read-only aggregate over the investor ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_shares: u64,
    pub total_investors: usize,
    pub allocated_shares: u64,
    /// Treasury-retained equity with no distribution target
    pub unallocated_shares: u64,
    pub total_balance: Amount,
    pub total_dividends: Amount,
}

/// Serializable image of the investor ledger, investors in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total_shares: u64,
    pub investors: Vec<Investor>,
}

impl LedgerSnapshot {
    pub fn new(total_shares: u64, investors: Vec<Investor>) -> Self {
        Self {
            total_shares,
            investors,
        }
    }

    /// Sum of all investors' shares, `None` if it does not fit in `u64`.
    pub fn allocated_shares(&self) -> Option<u64> {
        self.investors
            .iter()
            .try_fold(0u64, |acc, inv| acc.checked_add(inv.shares))
    }
}

impl Default for LedgerSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_SHARES, Vec::new())
    }
}

/// Everything the treasury needs to survive a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryState {
    pub settings: SystemSettings,
    pub ledger: LedgerSnapshot,
}
