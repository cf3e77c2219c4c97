//! Platform settings store
//!
//! Holds the fee percentage, the investor dividend percentage and the terms
//! text. Updates are last-write-wins; both percentages are replaced under one
//! write lock so readers never see a half-applied update.

use crate::errors::{ensure_non_negative, Result, TreasuryError};
use bazaar_types::{validate_percentage, Amount, RevenueSplit, SystemSettings};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct SettingsStore {
    settings: RwLock<SystemSettings>,
}

impl SettingsStore {
    /// Store initialized with the platform defaults (fee 10%, dividend 30%).
    pub fn new() -> Self {
        Self::default()
    }

    /// Store initialized from previously persisted or configured settings.
    pub fn with_settings(settings: SystemSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings: RwLock::new(settings),
        })
    }

    /// Current configuration snapshot.
    pub fn get_settings(&self) -> SystemSettings {
        self.settings.read().clone()
    }

    /// Replace both percentages. Out-of-range values are rejected and
    /// nothing is stored.
    pub fn update_settings(
        &self,
        platform_fee: Decimal,
        investor_dividend: Decimal,
    ) -> Result<SystemSettings> {
        if let Err(err) = validate_percentage("platform_fee_percentage", platform_fee)
            .and_then(|_| validate_percentage("investor_dividend_percentage", investor_dividend))
        {
            warn!(target: "treasury", error = %err, "Rejected settings update");
            return Err(err.into());
        }

        let mut settings = self.settings.write();
        settings.platform_fee_percentage = platform_fee;
        settings.investor_dividend_percentage = investor_dividend;

        info!(
            target: "treasury",
            platform_fee = %platform_fee,
            investor_dividend = %investor_dividend,
            "Updated fee settings"
        );

        Ok(settings.clone())
    }

    pub fn platform_fee_rate(&self) -> Decimal {
        self.settings.read().platform_fee_rate()
    }

    pub fn investor_dividend_rate(&self) -> Decimal {
        self.settings.read().investor_dividend_rate()
    }

    /// Replace the terms and conditions text.
    pub fn update_terms(&self, text: impl Into<String>) -> SystemSettings {
        let mut settings = self.settings.write();
        settings.terms_and_conditions = text.into();
        info!(
            target: "treasury",
            length = settings.terms_and_conditions.len(),
            "Updated terms and conditions"
        );
        settings.clone()
    }

    /// Break collected revenue down into platform fee, investor pool and
    /// seller proceeds using the current rates.
    pub fn split_revenue(&self, collected: Amount) -> Result<RevenueSplit> {
        ensure_non_negative("collected revenue", collected)?;
        self.settings
            .read()
            .split_revenue(collected)
            .ok_or(TreasuryError::CalculationOverflow("revenue split"))
    }
}
