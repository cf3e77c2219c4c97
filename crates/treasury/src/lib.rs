//! Bazaar Treasury Module
//!
//! Fee & dividend distribution engine:
//! - Platform fee / investor dividend settings
//! - Investor ledger with a fixed total-share denominator
//! - Share-weighted pool distribution
//! - Direct dividend credit and balance-checked reinvestment debit
//!
//! All ledger mutations are serialized behind one ledger-wide lock; see
//! [`InvestorLedger`].

pub mod distribution;
pub mod errors;
pub mod investor_ledger;
pub mod settings_store;
pub mod settlement;
pub mod treasury;

pub use distribution::{DistributionResult, InvestorPayout};
pub use errors::{Result, TreasuryError};
pub use investor_ledger::InvestorLedger;
pub use settings_store::SettingsStore;
pub use settlement::InvestOutcome;
pub use treasury::{RevenueDistribution, Treasury};
