//! Treasury facade
//!
//! Couples the settings store with a shared ledger handle and converts to and
//! from the persisted [`TreasuryState`].

use crate::distribution::DistributionResult;
use crate::errors::Result;
use crate::investor_ledger::InvestorLedger;
use crate::settings_store::SettingsStore;
use bazaar_types::{Amount, RevenueSplit, TreasuryState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Revenue split together with the distribution of its investor pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueDistribution {
    pub split: RevenueSplit,
    pub distribution: DistributionResult,
}

#[derive(Debug)]
pub struct Treasury {
    settings: SettingsStore,
    ledger: Arc<InvestorLedger>,
}

impl Treasury {
    pub fn new(settings: SettingsStore, ledger: Arc<InvestorLedger>) -> Self {
        Self { settings, ledger }
    }

    /// Rebuild from persisted state, re-checking settings and ledger invariants.
    pub fn from_state(state: TreasuryState) -> Result<Self> {
        let settings = SettingsStore::with_settings(state.settings)?;
        let ledger = InvestorLedger::from_snapshot(state.ledger)?;
        Ok(Self::new(settings, Arc::new(ledger)))
    }

    /// Image suitable for a repository `save`.
    pub fn state(&self) -> TreasuryState {
        TreasuryState {
            settings: self.settings.get_settings(),
            ledger: self.ledger.snapshot(),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn ledger(&self) -> &InvestorLedger {
        &self.ledger
    }

    /// Shared handle for concurrent request handlers.
    pub fn ledger_handle(&self) -> Arc<InvestorLedger> {
        Arc::clone(&self.ledger)
    }

    /// Split collected revenue with the current rates and distribute the
    /// investor pool across the ledger.
    pub fn distribute_revenue(&self, collected: Amount) -> Result<RevenueDistribution> {
        let split = self.settings.split_revenue(collected)?;
        let distribution = self.ledger.distribute_pool(split.investor_pool)?;

        info!(
            target: "treasury",
            collected = %split.collected,
            platform_fee = %split.platform_fee,
            investor_pool = %split.investor_pool,
            "Revenue distributed"
        );

        Ok(RevenueDistribution {
            split,
            distribution,
        })
    }
}
