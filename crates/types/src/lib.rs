//! Bazaar shared types
//!
//! Plain data shared by the treasury engine, the storage backends and the
//! operator binary. Nothing in here locks or performs I/O.
//!
//! Monetary unit: [`Amount`] (`rust_decimal::Decimal`), so fractional balances
//! such as `345.5` are exact.

pub mod investor;
pub mod ledger;
pub mod settings;

pub use investor::*;
pub use ledger::*;
pub use settings::*;

/// Monetary amount used for balances, dividends and pools.
pub type Amount = rust_decimal::Decimal;
